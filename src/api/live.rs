// Live remote client - implements every capability interface against the
// hosted API over HTTP

use crate::api::*;
use crate::models::*;
use crate::API_BASE_URL;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Mutex;

const PAGE_LIMIT: usize = 20;

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct PagedEnvelope<T> {
    data: Vec<T>,
    meta: PageMeta,
}

#[derive(Deserialize)]
struct PageMeta {
    total: usize,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    code: Option<i32>,
}

#[derive(Deserialize)]
struct WireAgent {
    credits: i64,
}

pub struct LiveClient {
    client: reqwest::Client,
    base_url: String,
    // Systems whose waypoint lists have been requested, for pagination reconcile
    known_systems: Mutex<HashSet<String>>,
}

impl LiveClient {
    pub fn new(token: String) -> Result<Self, Box<dyn std::error::Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(LiveClient {
            client,
            base_url: API_BASE_URL.to_string(),
            known_systems: Mutex::new(HashSet::new()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::new(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            // Prefer the structured error body when the server sends one
            if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(&body) {
                return Err(ApiError {
                    code: parsed.error.code,
                    message: parsed.error.message,
                });
            }
            if status.as_u16() == 429 {
                return Err(ApiError::new("rate limit exceeded"));
            }
            return Err(ApiError::new(format!(
                "request failed with status {}: {}",
                status, body
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::new(format!("failed to decode response: {}", e)))
    }

    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ApiError::new(format!("request error: {}", e)))?;
        let envelope: Envelope<T> = Self::decode(response).await?;
        Ok(envelope.data)
    }

    async fn post_data<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> ApiResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::new(format!("request error: {}", e)))?;
        let envelope: Envelope<T> = Self::decode(response).await?;
        Ok(envelope.data)
    }

    async fn patch_data<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> ApiResult<T> {
        let response = self
            .client
            .patch(self.url(path))
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::new(format!("request error: {}", e)))?;
        let envelope: Envelope<T> = Self::decode(response).await?;
        Ok(envelope.data)
    }

    async fn get_all_pages<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let url = format!("{}?page={}&limit={}", path, page, PAGE_LIMIT);
            let response = self
                .client
                .get(self.url(&url))
                .send()
                .await
                .map_err(|e| ApiError::new(format!("request error: {}", e)))?;
            let envelope: PagedEnvelope<T> = Self::decode(response).await?;
            items.extend(envelope.data);
            if items.len() >= envelope.meta.total {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

#[async_trait]
impl FleetApi for LiveClient {
    async fn agent(&self) -> ApiResult<AgentInfo> {
        self.get_data("/my/agent").await
    }

    async fn list_ships(&self) -> ApiResult<Vec<Ship>> {
        self.get_all_pages("/my/ships").await
    }

    async fn get_ship(&self, ship: &str) -> ApiResult<Ship> {
        self.get_data(&format!("/my/ships/{}", ship)).await
    }

    async fn orbit(&self, ship: &str) -> ApiResult<ShipNav> {
        #[derive(Deserialize)]
        struct NavData {
            nav: ShipNav,
        }
        let data: NavData = self
            .post_data(&format!("/my/ships/{}/orbit", ship), serde_json::json!({}))
            .await?;
        Ok(data.nav)
    }

    async fn dock(&self, ship: &str) -> ApiResult<ShipNav> {
        #[derive(Deserialize)]
        struct NavData {
            nav: ShipNav,
        }
        let data: NavData = self
            .post_data(&format!("/my/ships/{}/dock", ship), serde_json::json!({}))
            .await?;
        Ok(data.nav)
    }

    async fn set_flight_mode(&self, ship: &str, mode: FlightMode) -> ApiResult<ShipNav> {
        self.patch_data(
            &format!("/my/ships/{}/nav", ship),
            serde_json::json!({ "flightMode": mode.as_str() }),
        )
        .await
    }

    async fn navigate(&self, ship: &str, waypoint: &str) -> ApiResult<NavigationData> {
        self.post_data(
            &format!("/my/ships/{}/navigate", ship),
            serde_json::json!({ "waypointSymbol": waypoint }),
        )
        .await
    }

    async fn jump(&self, ship: &str, gate_waypoint: &str) -> ApiResult<JumpData> {
        self.post_data(
            &format!("/my/ships/{}/jump", ship),
            serde_json::json!({ "waypointSymbol": gate_waypoint }),
        )
        .await
    }

    async fn extract(&self, ship: &str, survey: Option<Survey>) -> ApiResult<ExtractionData> {
        #[derive(Deserialize)]
        struct WireExtractionData {
            cargo: ShipCargo,
            cooldown: ShipCooldown,
            extraction: WireExtraction,
        }
        #[derive(Deserialize)]
        struct WireExtraction {
            #[serde(rename = "yield")]
            extracted: ExtractionYield,
        }

        let body = match &survey {
            Some(survey) => serde_json::json!({ "survey": survey }),
            None => serde_json::json!({}),
        };
        let data: WireExtractionData = self
            .post_data(&format!("/my/ships/{}/extract", ship), body)
            .await?;
        Ok(ExtractionData {
            cargo: data.cargo,
            cooldown: data.cooldown,
            extracted: data.extraction.extracted,
        })
    }

    async fn siphon(&self, ship: &str) -> ApiResult<ExtractionData> {
        #[derive(Deserialize)]
        struct WireSiphonData {
            cargo: ShipCargo,
            cooldown: ShipCooldown,
            siphon: WireSiphon,
        }
        #[derive(Deserialize)]
        struct WireSiphon {
            #[serde(rename = "yield")]
            extracted: ExtractionYield,
        }

        let data: WireSiphonData = self
            .post_data(&format!("/my/ships/{}/siphon", ship), serde_json::json!({}))
            .await?;
        Ok(ExtractionData {
            cargo: data.cargo,
            cooldown: data.cooldown,
            extracted: data.siphon.extracted,
        })
    }

    async fn survey(&self, ship: &str) -> ApiResult<SurveyData> {
        self.post_data(&format!("/my/ships/{}/survey", ship), serde_json::json!({}))
            .await
    }

    async fn refuel(&self, ship: &str) -> ApiResult<RefuelData> {
        #[derive(Deserialize)]
        struct WireRefuel {
            agent: WireAgent,
            fuel: ShipFuel,
            transaction: MarketTransaction,
        }
        let data: WireRefuel = self
            .post_data(&format!("/my/ships/{}/refuel", ship), serde_json::json!({}))
            .await?;
        Ok(RefuelData {
            fuel: data.fuel,
            transaction: data.transaction,
            credits: data.agent.credits,
        })
    }

    async fn purchase_cargo(&self, ship: &str, good: &str, units: i32) -> ApiResult<TradeData> {
        #[derive(Deserialize)]
        struct WireTrade {
            agent: WireAgent,
            cargo: ShipCargo,
            transaction: MarketTransaction,
        }
        let data: WireTrade = self
            .post_data(
                &format!("/my/ships/{}/purchase", ship),
                serde_json::json!({ "symbol": good, "units": units }),
            )
            .await?;
        Ok(TradeData {
            cargo: data.cargo,
            transaction: data.transaction,
            credits: data.agent.credits,
        })
    }

    async fn sell_cargo(&self, ship: &str, good: &str, units: i32) -> ApiResult<TradeData> {
        #[derive(Deserialize)]
        struct WireTrade {
            agent: WireAgent,
            cargo: ShipCargo,
            transaction: MarketTransaction,
        }
        let data: WireTrade = self
            .post_data(
                &format!("/my/ships/{}/sell", ship),
                serde_json::json!({ "symbol": good, "units": units }),
            )
            .await?;
        Ok(TradeData {
            cargo: data.cargo,
            transaction: data.transaction,
            credits: data.agent.credits,
        })
    }

    async fn transfer_cargo(
        &self,
        from: &str,
        to: &str,
        good: &str,
        units: i32,
    ) -> ApiResult<ShipCargo> {
        #[derive(Deserialize)]
        struct WireTransfer {
            cargo: ShipCargo,
        }
        let data: WireTransfer = self
            .post_data(
                &format!("/my/ships/{}/transfer", from),
                serde_json::json!({ "tradeSymbol": good, "units": units, "shipSymbol": to }),
            )
            .await?;
        Ok(data.cargo)
    }

    async fn jettison(&self, ship: &str, good: &str, units: i32) -> ApiResult<ShipCargo> {
        #[derive(Deserialize)]
        struct WireJettison {
            cargo: ShipCargo,
        }
        let data: WireJettison = self
            .post_data(
                &format!("/my/ships/{}/jettison", ship),
                serde_json::json!({ "symbol": good, "units": units }),
            )
            .await?;
        Ok(data.cargo)
    }

    async fn chart(&self, ship: &str) -> ApiResult<ChartData> {
        self.post_data(&format!("/my/ships/{}/chart", ship), serde_json::json!({}))
            .await
    }

    async fn negotiate_contract(&self, ship: &str) -> ApiResult<Contract> {
        #[derive(Deserialize)]
        struct WireNegotiation {
            contract: Contract,
        }
        let data: WireNegotiation = self
            .post_data(
                &format!("/my/ships/{}/negotiate/contract", ship),
                serde_json::json!({}),
            )
            .await?;
        Ok(data.contract)
    }
}

#[async_trait]
impl GalaxyApi for LiveClient {
    async fn system_waypoints(&self, system: &str) -> ApiResult<Vec<Waypoint>> {
        let waypoints = self
            .get_all_pages(&format!("/systems/{}/waypoints", system))
            .await?;
        if let Ok(mut known) = self.known_systems.lock() {
            known.insert(system.to_string());
        }
        Ok(waypoints)
    }

    async fn reconcile(&self) -> ApiResult<Vec<System>> {
        let systems: Vec<String> = match self.known_systems.lock() {
            Ok(known) => known.iter().cloned().collect(),
            Err(_) => return Ok(Vec::new()),
        };
        let mut refreshed = Vec::new();
        for symbol in systems {
            let waypoints = self
                .get_all_pages(&format!("/systems/{}/waypoints", symbol))
                .await?;
            refreshed.push(System { symbol, waypoints });
        }
        Ok(refreshed)
    }
}

#[async_trait]
impl MarketApi for LiveClient {
    async fn market(&self, system: &str, waypoint: &str) -> ApiResult<MarketData> {
        self.get_data(&format!("/systems/{}/waypoints/{}/market", system, waypoint))
            .await
    }
}

#[async_trait]
impl ShipyardApi for LiveClient {
    async fn shipyard(&self, system: &str, waypoint: &str) -> ApiResult<Shipyard> {
        self.get_data(&format!(
            "/systems/{}/waypoints/{}/shipyard",
            system, waypoint
        ))
        .await
    }
}

#[async_trait]
impl JumpGateApi for LiveClient {
    async fn connections(&self, system: &str, waypoint: &str) -> ApiResult<Vec<String>> {
        let gate: JumpGate = self
            .get_data(&format!(
                "/systems/{}/waypoints/{}/jump-gate",
                system, waypoint
            ))
            .await?;
        Ok(gate.connections)
    }
}

#[async_trait]
impl ContractApi for LiveClient {
    async fn list(&self) -> ApiResult<Vec<Contract>> {
        self.get_all_pages("/my/contracts").await
    }

    async fn accept(&self, contract_id: &str) -> ApiResult<Contract> {
        #[derive(Deserialize)]
        struct WireAccept {
            contract: Contract,
        }
        let data: WireAccept = self
            .post_data(
                &format!("/my/contracts/{}/accept", contract_id),
                serde_json::json!({}),
            )
            .await?;
        Ok(data.contract)
    }

    async fn deliver(
        &self,
        ship: &str,
        contract_id: &str,
        good: &str,
        units: i32,
    ) -> ApiResult<DeliveryData> {
        self.post_data(
            &format!("/my/contracts/{}/deliver", contract_id),
            serde_json::json!({ "shipSymbol": ship, "tradeSymbol": good, "units": units }),
        )
        .await
    }

    async fn fulfill(&self, contract_id: &str) -> ApiResult<Contract> {
        #[derive(Deserialize)]
        struct WireFulfill {
            contract: Contract,
        }
        let data: WireFulfill = self
            .post_data(
                &format!("/my/contracts/{}/fulfill", contract_id),
                serde_json::json!({}),
            )
            .await?;
        Ok(data.contract)
    }
}

#[async_trait]
impl ConstructionApi for LiveClient {
    async fn site(&self, system: &str, waypoint: &str) -> ApiResult<ConstructionSite> {
        self.get_data(&format!(
            "/systems/{}/waypoints/{}/construction",
            system, waypoint
        ))
        .await
    }

    async fn supply(
        &self,
        ship: &str,
        waypoint: &str,
        good: &str,
        units: i32,
    ) -> ApiResult<ConstructionSupplyData> {
        let system = system_symbol_of(waypoint);
        self.post_data(
            &format!(
                "/systems/{}/waypoints/{}/construction/supply",
                system, waypoint
            ),
            serde_json::json!({ "shipSymbol": ship, "tradeSymbol": good, "units": units }),
        )
        .await
    }
}
