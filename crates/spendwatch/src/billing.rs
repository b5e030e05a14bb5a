use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Billing;
use crate::error::{Error, Result};
use crate::report::{Amount, DateRange};

#[cfg(feature = "costexplorer")]
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region};
#[cfg(feature = "costexplorer")]
use aws_sdk_costexplorer::{
    error::DisplayErrorContext,
    types::{DateInterval, Granularity},
    Client as CostExplorerClient,
};

pub const UNBLENDED_COST: &str = "UnblendedCost";

#[cfg(feature = "costexplorer")]
const DEFAULT_REGION: &str = "us-east-1";

/// One result bucket of a cost query.
#[derive(Debug, Clone, PartialEq)]
pub struct CostBucket {
    pub amount: String,
    pub unit: Option<String>,
}

#[async_trait]
pub trait CostSource: Send + Sync {
    /// Monthly unblended cost buckets for `range`, in the order the service returns them.
    async fn query(&self, range: &DateRange) -> Result<Vec<CostBucket>>;
}

pub async fn source_from_billing(billing: &Billing) -> Result<Box<dyn CostSource>> {
    match billing {
        Billing::Fixture { path } => Ok(Box::new(FixtureSource { path: path.clone() })),
        #[cfg(feature = "costexplorer")]
        Billing::CostExplorer { region, profile } => Ok(Box::new(
            CostExplorerSource::load(region.as_deref(), profile.as_deref()).await,
        )),
    }
}

/// Month-to-date cost for `range`, rounded to cents.
///
/// Only the first bucket is read. An empty result (no spend posted yet) counts as zero.
pub async fn fetch_cost(source: &dyn CostSource, range: &DateRange) -> Result<Amount> {
    let buckets = source.query(range).await?;
    let Some(first) = buckets.first() else {
        warn!(
            start = %range.start_iso(),
            end = %range.end_iso(),
            "billing query returned no result buckets; reporting zero cost"
        );
        return Ok(Amount::zero());
    };
    if buckets.len() > 1 {
        debug!(count = buckets.len(), "billing query returned several buckets, using the first");
    }

    let value: f64 = first.amount.trim().parse().map_err(|e| {
        Error::upstream(format!("unparseable cost amount {:?}: {e}", first.amount))
    })?;
    if !value.is_finite() {
        return Err(Error::upstream(format!(
            "non-finite cost amount {:?}",
            first.amount
        )));
    }
    debug!(amount = %first.amount, unit = ?first.unit, "unblended cost");
    Ok(Amount::rounded(value))
}

/// Reads a saved `GetCostAndUsage` response from disk.
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CostAndUsage {
    #[serde(default)]
    results_by_time: Vec<ResultByTime>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ResultByTime {
    #[serde(default)]
    total: HashMap<String, MetricValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetricValue {
    amount: Option<String>,
    unit: Option<String>,
}

#[async_trait]
impl CostSource for FixtureSource {
    async fn query(&self, _range: &DateRange) -> Result<Vec<CostBucket>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::upstream(format!("reading cost fixture {}: {e}", self.path.display()))
        })?;
        let doc: CostAndUsage = serde_json::from_str(&raw).map_err(|e| {
            Error::upstream(format!("parsing cost fixture {}: {e}", self.path.display()))
        })?;

        doc.results_by_time
            .into_iter()
            .map(|r| {
                let metric = r
                    .total
                    .get(UNBLENDED_COST)
                    .ok_or_else(|| Error::upstream("result bucket has no UnblendedCost total"))?;
                let amount = metric
                    .amount
                    .clone()
                    .ok_or_else(|| Error::upstream("UnblendedCost total has no amount"))?;
                Ok(CostBucket {
                    amount,
                    unit: metric.unit.clone(),
                })
            })
            .collect()
    }
}

/// AWS Cost Explorer `GetCostAndUsage`, monthly granularity.
#[cfg(feature = "costexplorer")]
pub struct CostExplorerSource {
    client: CostExplorerClient,
}

#[cfg(feature = "costexplorer")]
impl CostExplorerSource {
    pub fn new(client: CostExplorerClient) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS provider chain. Region falls back to us-east-1,
    /// where the Cost Explorer endpoint lives.
    pub async fn load(region: Option<&str>, profile: Option<&str>) -> Self {
        let region_provider = RegionProviderChain::first_try(region.map(|r| Region::new(r.to_owned())))
            .or_default_provider()
            .or_else(Region::new(DEFAULT_REGION));
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(p) = profile {
            loader = loader.profile_name(p);
        }
        let aws_cfg = loader.load().await;
        Self::new(CostExplorerClient::new(&aws_cfg))
    }
}

#[cfg(feature = "costexplorer")]
#[async_trait]
impl CostSource for CostExplorerSource {
    async fn query(&self, range: &DateRange) -> Result<Vec<CostBucket>> {
        let period = DateInterval::builder()
            .start(range.start_iso())
            .end(range.end_iso())
            .build()
            .map_err(Error::upstream)?;

        let resp = self
            .client
            .get_cost_and_usage()
            .time_period(period)
            .granularity(Granularity::Monthly)
            .metrics(UNBLENDED_COST)
            .send()
            .await
            .map_err(|e| Error::upstream(DisplayErrorContext(e).to_string()))?;

        let mut out = Vec::new();
        for bucket in resp.results_by_time() {
            let metric = bucket
                .total()
                .and_then(|t| t.get(UNBLENDED_COST))
                .ok_or_else(|| Error::upstream("result bucket has no UnblendedCost total"))?;
            let amount = metric
                .amount()
                .ok_or_else(|| Error::upstream("UnblendedCost total has no amount"))?;
            out.push(CostBucket {
                amount: amount.to_string(),
                unit: metric.unit().map(str::to_string),
            });
        }
        Ok(out)
    }
}
