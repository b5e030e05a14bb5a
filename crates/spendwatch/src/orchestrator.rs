use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use crate::billing::{fetch_cost, CostSource};
use crate::error::{Error, Result};
use crate::report::{render_message, DateRange};
use crate::sink::SlackNotifier;

/// What a single invocation reports back to its trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// One month-to-date report: fetch, format, send.
pub struct Job<'a> {
    source: &'a dyn CostSource,
    notifier: &'a SlackNotifier,
}

impl<'a> Job<'a> {
    pub fn new(source: &'a dyn CostSource, notifier: &'a SlackNotifier) -> Self {
        Self { source, notifier }
    }

    /// Run for today's date on the local clock.
    pub async fn run(&self) -> Result<InvocationResult> {
        self.send(DateRange::current()).await
    }

    pub async fn run_for(&self, today: NaiveDate) -> Result<InvocationResult> {
        self.send(DateRange::month_to_date(today)).await
    }

    /// Fetch and format without delivering.
    pub async fn preview_for(&self, today: NaiveDate) -> Result<String> {
        self.build_message(&DateRange::month_to_date(today)).await
    }

    async fn build_message(&self, range: &DateRange) -> Result<String> {
        debug!(start = %range.start_iso(), end = %range.end_iso(), "fetching cost");
        let amount = fetch_cost(self.source, range).await?;
        debug!(%amount, "formatting report");
        Ok(render_message(range, amount))
    }

    async fn send(&self, range: DateRange) -> Result<InvocationResult> {
        let message = self.build_message(&range).await?;

        debug!("sending report");
        let delivery = self.notifier.notify(&message).await?;
        if delivery.status_code != 200 {
            return Err(Error::Delivery {
                status: delivery.status_code,
                body: delivery.body,
            });
        }

        info!(start = %range.start_iso(), end = %range.end_iso(), "report sent");
        Ok(InvocationResult {
            status_code: 200,
            body: format!("Sent report to Slack: {message}"),
        })
    }
}
