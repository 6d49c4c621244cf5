use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketData {
    pub symbol: String,
    #[serde(default)]
    pub exports: Vec<TradeGood>,
    #[serde(default)]
    pub imports: Vec<TradeGood>,
    #[serde(default)]
    pub exchange: Vec<TradeGood>,
    #[serde(rename = "tradeGoods", default)]
    pub trade_goods: Vec<MarketTradeGood>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TradeGood {
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketTradeGood {
    pub symbol: String,
    #[serde(rename = "tradeVolume")]
    pub trade_volume: i32,
    pub supply: String,
    #[serde(rename = "purchasePrice")]
    pub purchase_price: i32,
    #[serde(rename = "sellPrice")]
    pub sell_price: i32,
}

impl MarketData {
    pub fn good(&self, symbol: &str) -> Option<&MarketTradeGood> {
        self.trade_goods.iter().find(|g| g.symbol == symbol)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MarketTransaction {
    #[serde(rename = "waypointSymbol")]
    pub waypoint_symbol: String,
    #[serde(rename = "shipSymbol")]
    pub ship_symbol: String,
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    pub units: i32,
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: i32,
    #[serde(rename = "totalPrice")]
    pub total_price: i32,
}
