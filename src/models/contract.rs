use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Contract {
    pub id: String,
    #[serde(rename = "factionSymbol")]
    pub faction_symbol: String,
    #[serde(rename = "type")]
    pub contract_type: String,
    pub terms: ContractTerms,
    pub accepted: bool,
    pub fulfilled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContractTerms {
    pub payment: ContractPayment,
    #[serde(default)]
    pub deliver: Vec<DeliveryItem>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ContractPayment {
    #[serde(rename = "onAccepted")]
    pub on_accepted: i64,
    #[serde(rename = "onFulfilled")]
    pub on_fulfilled: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeliveryItem {
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    #[serde(rename = "destinationSymbol")]
    pub destination_symbol: String,
    #[serde(rename = "unitsRequired")]
    pub units_required: i32,
    #[serde(rename = "unitsFulfilled")]
    pub units_fulfilled: i32,
}

impl DeliveryItem {
    pub fn units_remaining(&self) -> i32 {
        (self.units_required - self.units_fulfilled).max(0)
    }
}

impl Contract {
    pub fn deliveries_complete(&self) -> bool {
        self.terms.deliver.iter().all(|d| d.units_remaining() == 0)
    }

    pub fn next_delivery(&self) -> Option<&DeliveryItem> {
        self.terms.deliver.iter().find(|d| d.units_remaining() > 0)
    }

    pub fn required_goods(&self) -> Vec<String> {
        self.terms
            .deliver
            .iter()
            .filter(|d| d.units_remaining() > 0)
            .map(|d| d.trade_symbol.clone())
            .collect()
    }
}

// Construction site goal shared across the fleet
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConstructionSite {
    pub symbol: String,
    #[serde(default)]
    pub materials: Vec<ConstructionMaterial>,
    #[serde(rename = "isComplete", default)]
    pub is_complete: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConstructionMaterial {
    #[serde(rename = "tradeSymbol")]
    pub trade_symbol: String,
    pub required: i32,
    pub fulfilled: i32,
}

impl ConstructionMaterial {
    pub fn units_remaining(&self) -> i32 {
        (self.required - self.fulfilled).max(0)
    }
}

impl ConstructionSite {
    pub fn next_material(&self) -> Option<&ConstructionMaterial> {
        self.materials.iter().find(|m| m.units_remaining() > 0)
    }

    pub fn required_goods(&self) -> Vec<String> {
        self.materials
            .iter()
            .filter(|m| m.units_remaining() > 0)
            .map(|m| m.trade_symbol.clone())
            .collect()
    }
}
