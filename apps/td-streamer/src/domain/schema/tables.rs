//! Vendor Field Tables
//!
//! One table per record layout, in wire-index order. Index strings are what
//! the streamer puts in `content` records and expects in `parameters.fields`.

use super::Field;

/// `ACCT_ACTIVITY`: order and position activity for the streamer subscription key.
pub const ACCT_ACTIVITY: &[Field] = &[
    Field::new("0", "subscriptionKey"),
    Field::new("1", "accountNumber"),
    Field::new("2", "messageType"),
    Field::new("3", "messageData"),
];

/// `CHART_EQUITY`: one-minute OHLCV candles for equities.
pub const CHART_EQUITY: &[Field] = &[
    Field::new("0", "key"),
    Field::new("1", "openPrice"),
    Field::new("2", "highPrice"),
    Field::new("3", "lowPrice"),
    Field::new("4", "closePrice"),
    Field::new("5", "volume"),
    Field::new("6", "sequence"),
    Field::new("7", "chartTime"),
];

/// `CHART_FUTURES` layout, shared by `CHART_OPTIONS`.
pub const CHART_FUTURES: &[Field] = &[
    Field::new("0", "key"),
    Field::new("1", "chartTime"),
    Field::new("2", "openPrice"),
    Field::new("3", "highPrice"),
    Field::new("4", "lowPrice"),
    Field::new("5", "closePrice"),
    Field::new("6", "volume"),
];

/// `NEWS_HEADLINE`
pub const NEWS_HEADLINE: &[Field] = &[
    Field::new("0", "symbol"),
    Field::new("1", "errorCode"),
    Field::new("2", "storyDatetime"),
    Field::new("3", "headlineID"),
    Field::new("4", "status"),
    Field::new("5", "headline"),
    Field::new("6", "storyID"),
    Field::new("7", "countForKeyword"),
    Field::new("8", "keywordArray"),
    Field::new("9", "isHot"),
    Field::new("10", "storySource"),
];

/// Time & sales layout, shared by every `TIMESALE_*` service.
pub const TIMESALE: &[Field] = &[
    Field::new("0", "symbol"),
    Field::new("1", "tradeTime"),
    Field::new("2", "lastPrice"),
    Field::new("3", "lastSize"),
    Field::new("4", "lastSequence"),
];

/// `QUOTE`: level-one equity quotes.
pub const QUOTE: &[Field] = &[
    Field::new("0", "symbol"),
    Field::new("1", "bidPrice"),
    Field::new("2", "askPrice"),
    Field::new("3", "lastPrice"),
    Field::new("4", "bidSize"),
    Field::new("5", "askSize"),
    Field::new("6", "askID"),
    Field::new("7", "bidID"),
    Field::new("8", "totalVolume"),
    Field::new("9", "lastSize"),
    Field::new("10", "tradeTime"),
    Field::new("11", "quoteTime"),
    Field::new("12", "highPrice"),
    Field::new("13", "lowPrice"),
    Field::new("14", "bidTick"),
    Field::new("15", "closePrice"),
    Field::new("16", "exchangeID"),
    Field::new("17", "marginable"),
    Field::new("18", "shortable"),
    Field::new("19", "islandBid"),
    Field::new("20", "islandAsk"),
    Field::new("21", "islandVolume"),
    Field::new("22", "quoteDay"),
    Field::new("23", "tradeDay"),
    Field::new("24", "volatility"),
    Field::new("25", "description"),
    Field::new("26", "lastID"),
    Field::new("27", "digits"),
    Field::new("28", "openPrice"),
    Field::new("29", "netChange"),
    Field::new("30", "highPrice52Week"),
    Field::new("31", "lowPrice52Week"),
    Field::new("32", "peRatio"),
    Field::new("33", "dividendAmount"),
    Field::new("34", "dividendYield"),
    Field::new("35", "islandBidSize"),
    Field::new("36", "islandAskSize"),
    Field::new("37", "nav"),
    Field::new("38", "fundPrice"),
    Field::new("39", "exchangeName"),
    Field::new("40", "dividendDate"),
    Field::new("41", "regularMarketQuote"),
    Field::new("42", "regularMarketTrade"),
    Field::new("43", "regularMarketLastPrice"),
    Field::new("44", "regularMarketLastSize"),
    Field::new("45", "regularMarketTradeTime"),
    Field::new("46", "regularMarketTradeDay"),
    Field::new("47", "regularMarketNetChange"),
    Field::new("48", "securityStatus"),
    Field::new("49", "mark"),
    Field::new("50", "quoteTimeInLong"),
    Field::new("51", "tradeTimeInLong"),
    Field::new("52", "regularMarketTradeTimeInLong"),
];

/// `LEVELONE_FUTURES`
pub const LEVELONE_FUTURES: &[Field] = &[
    Field::new("0", "symbol"),
    Field::new("1", "bidPrice"),
    Field::new("2", "askPrice"),
    Field::new("3", "lastPrice"),
    Field::new("4", "bidSize"),
    Field::new("5", "askSize"),
    Field::new("6", "askID"),
    Field::new("7", "bidID"),
    Field::new("8", "totalVolume"),
    Field::new("9", "lastSize"),
    Field::new("10", "quoteTime"),
    Field::new("11", "tradeTime"),
    Field::new("12", "highPrice"),
    Field::new("13", "lowPrice"),
    Field::new("14", "closePrice"),
    Field::new("15", "exchangeID"),
    Field::new("16", "description"),
    Field::new("17", "lastID"),
    Field::new("18", "openPrice"),
    Field::new("19", "netChange"),
    Field::new("20", "futurePercentChange"),
    Field::new("21", "exchangeName"),
    Field::new("22", "securityStatus"),
    Field::new("23", "openInterest"),
    Field::new("24", "mark"),
    Field::new("25", "tick"),
    Field::new("26", "tickAmount"),
    Field::new("27", "product"),
    Field::new("28", "futurePriceFormat"),
    Field::new("29", "futureTradingHours"),
    Field::new("30", "futureIsTradable"),
    Field::new("31", "futureMultiplier"),
    Field::new("32", "futureIsActive"),
    Field::new("33", "futureSettlementPrice"),
    Field::new("34", "futureActiveSymbol"),
    Field::new("35", "futureExpirationDate"),
];

/// `LEVELONE_FOREX`
pub const LEVELONE_FOREX: &[Field] = &[
    Field::new("0", "symbol"),
    Field::new("1", "bidPrice"),
    Field::new("2", "askPrice"),
    Field::new("3", "lastPrice"),
    Field::new("4", "bidSize"),
    Field::new("5", "askSize"),
    Field::new("6", "totalVolume"),
    Field::new("7", "lastSize"),
    Field::new("8", "quoteTime"),
    Field::new("9", "tradeTime"),
    Field::new("10", "highPrice"),
    Field::new("11", "lowPrice"),
    Field::new("12", "closePrice"),
    Field::new("13", "exchangeID"),
    Field::new("14", "description"),
    Field::new("15", "openPrice"),
    Field::new("16", "netChange"),
    Field::new("17", "percentChange"),
    Field::new("18", "exchangeName"),
    Field::new("19", "digits"),
    Field::new("20", "securityStatus"),
    Field::new("21", "tick"),
    Field::new("22", "tickAmount"),
    Field::new("23", "product"),
    Field::new("24", "tradingHours"),
    Field::new("25", "isTradable"),
    Field::new("26", "marketMaker"),
    Field::new("27", "highPrice52Week"),
    Field::new("28", "lowPrice52Week"),
    Field::new("29", "mark"),
];
