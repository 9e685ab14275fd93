//! One module per supported venue. Each exposes a single public adapter
//! type implementing `crate::adapter::ExchangeAdapter`.

pub mod alphavantage;
pub mod binance;
pub mod binance_us;
pub mod bitcointrade;
pub mod bitget;
pub mod bitmart;
pub mod bitstamp;
pub mod bittrex;
pub mod coinbase;
pub mod gemini;
pub mod kraken;
pub mod kucoin;
pub mod okcoin;
pub mod okx;
pub mod open_exchange_rates;
pub mod whitebit;
pub mod xignite;

pub use alphavantage::AlphavantageAdapter;
pub use binance::BinanceAdapter;
pub use binance_us::BinanceUsAdapter;
pub use bitcointrade::BitcointradeAdapter;
pub use bitget::BitgetAdapter;
pub use bitmart::BitMartAdapter;
pub use bitstamp::BitstampAdapter;
pub use bittrex::BittrexAdapter;
pub use coinbase::CoinbaseAdapter;
pub use gemini::GeminiAdapter;
pub use kraken::KrakenAdapter;
pub use kucoin::KuCoinAdapter;
pub use okcoin::OkCoinAdapter;
pub use okx::OkxAdapter;
pub use open_exchange_rates::OpenExchangeRatesAdapter;
pub use whitebit::WhitebitAdapter;
pub use xignite::XigniteAdapter;
