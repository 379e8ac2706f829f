//! External data provider clients
//!
//! Each upstream source sits behind an object-safe trait so the engine and
//! tests can inject alternatives.

pub mod market;
pub mod markets;
pub mod news;

pub use market::{CompanySnapshot, MarketDataProvider, PriceBar, YahooMarketData};
pub use markets::{GammaMarketsProvider, MarketItem, PredictionMarketProvider};
pub use news::{HttpNewsProvider, NewsItem, NewsProvider};
