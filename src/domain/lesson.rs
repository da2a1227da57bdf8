//! Short lessons shown next to the backtest.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::TradelogicError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lesson {
    Stocks,
    MovingAverages,
    Returns,
}

impl Lesson {
    pub fn all() -> [Lesson; 3] {
        [Lesson::Stocks, Lesson::MovingAverages, Lesson::Returns]
    }

    pub fn slug(self) -> &'static str {
        match self {
            Lesson::Stocks => "stocks",
            Lesson::MovingAverages => "moving-averages",
            Lesson::Returns => "returns",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Lesson::Stocks => "What is a stock?",
            Lesson::MovingAverages => "How does the moving-average strategy work?",
            Lesson::Returns => "How do you measure investment profitability?",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            Lesson::Stocks => "A share of stock is a unit of ownership in a company.",
            Lesson::MovingAverages => {
                "When the short moving average crosses the long one from below, that is a \
                 buy signal; when it crosses from above, that is a sell signal."
            }
            Lesson::Returns => "Profit can be measured with the logarithmic return: ln(Pt / Pt-1).",
        }
    }
}

impl fmt::Display for Lesson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Lesson {
    type Err = TradelogicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let topic = s.trim().to_lowercase();
        Lesson::all()
            .into_iter()
            .find(|l| l.slug() == topic)
            .ok_or(TradelogicError::UnknownLesson { topic })
    }
}
