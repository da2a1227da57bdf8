//! HTML templates using Askama.

use askama::Template;

use crate::domain::lesson::Lesson;
use crate::domain::runner::BacktestRequest;

pub struct LessonLink {
    pub slug: &'static str,
    pub title: &'static str,
}

pub fn lesson_links() -> Vec<LessonLink> {
    Lesson::all()
        .into_iter()
        .map(|l| LessonLink {
            slug: l.slug(),
            title: l.title(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ticker: String,
    pub short_window: usize,
    pub long_window: usize,
    pub start_date: String,
    pub end_date: String,
    pub lessons: Vec<LessonLink>,
}

impl DashboardTemplate {
    pub fn from_defaults(defaults: &BacktestRequest) -> Self {
        Self {
            ticker: defaults.ticker.clone(),
            short_window: defaults.short_window,
            long_window: defaults.long_window,
            start_date: defaults.start_date.to_string(),
            end_date: defaults.end_date.to_string(),
            lessons: lesson_links(),
        }
    }
}

#[derive(Template)]
#[template(path = "lessons.html")]
pub struct LessonsTemplate {
    pub lessons: Vec<LessonLink>,
}

#[derive(Template)]
#[template(path = "lesson.html")]
pub struct LessonTemplate {
    pub slug: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

impl From<Lesson> for LessonTemplate {
    fn from(lesson: Lesson) -> Self {
        Self {
            slug: lesson.slug(),
            title: lesson.title(),
            body: lesson.body(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
