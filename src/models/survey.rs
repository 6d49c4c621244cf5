use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Survey {
    pub signature: String,
    pub symbol: String,
    #[serde(default)]
    pub deposits: Vec<SurveyDeposit>,
    pub expiration: DateTime<Utc>,
    pub size: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SurveyDeposit {
    pub symbol: String,
}

impl Survey {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expiration > now
    }
}
