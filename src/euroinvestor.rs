use chrono::{Days, Months, NaiveDate, Utc};

use crate::config::{Config, Endpoints};
use crate::engine::HttpClient;
use crate::error::{BackendError, Result};
use crate::normalize;

/// Quote search backend: name search chained into a quote lookup, direct
/// quote lookup by id list, and chart prices for a single instrument.
#[derive(Debug, Clone)]
pub struct EuroinvestorBackend {
    client: HttpClient,
    endpoints: Endpoints,
}

impl EuroinvestorBackend {
    pub fn new(client: HttpClient, config: &Config) -> Self {
        log::debug!("Initializing Euroinvestor backend ...");
        EuroinvestorBackend {
            client,
            endpoints: config.endpoints.clone(),
        }
    }

    /// Search by name, then look up full quotes for every hit.
    ///
    /// The second request only starts after the first has been parsed; the id
    /// list is the sole link between the two stages.
    pub async fn search_name(&self, query: &str) -> Result<String> {
        log::debug!("search name: {query}");
        let body = self
            .client
            .get(&self.endpoints.search, &[("q", query)])
            .await?;

        let ids = normalize::collect_ids(&body)?;
        log::debug!("search name complete, quote ids: {ids:?}");
        if ids.is_empty() {
            return Ok("[]".to_string());
        }

        self.search_quote(&ids).await
    }

    /// Quotes for a comma-separated list of extRefIds.
    pub async fn search_quote(&self, ids: &str) -> Result<String> {
        log::debug!("search quote: {ids}");
        let body = self
            .client
            .get(&self.endpoints.quote, &[("ids", ids)])
            .await?;

        normalize::normalize_quotes(&body, &Utc::now())
    }

    pub async fn fetch_prices_for_chart(
        &self,
        ext_ref_id: &str,
        chart_type: ChartType,
    ) -> Result<String> {
        log::debug!("fetch prices for chart: {ext_ref_id} {chart_type:?}");
        let body = match chart_type.from_date(Utc::now().date_naive()) {
            None => {
                let url = format!(
                    "{}/{ext_ref_id}/intradays",
                    self.endpoints.intraday_prices.trim_end_matches('/')
                );
                self.client.get(&url, &[]).await?
            }
            Some(from) => {
                let url = format!(
                    "{}/{ext_ref_id}/closeprices",
                    self.endpoints.close_prices.trim_end_matches('/')
                );
                let from = from.format("%Y-%m-%d").to_string();
                self.client.get(&url, &[("fromDate", &from)]).await?
            }
        };

        normalize::chart_points(&body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartType {
    Intraday,
    Month,
    ThreeMonths,
    Year,
    ThreeYears,
}

impl ChartType {
    /// First day of the close price window; `None` for intraday.
    pub fn from_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            ChartType::Intraday => None,
            ChartType::Month => today.checked_sub_days(Days::new(30)),
            ChartType::ThreeMonths => today.checked_sub_days(Days::new(90)),
            ChartType::Year => today.checked_sub_months(Months::new(12)),
            ChartType::ThreeYears => today.checked_sub_months(Months::new(36)),
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl TryFrom<i32> for ChartType {
    type Error = BackendError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            0 => Ok(ChartType::Intraday),
            1 => Ok(ChartType::Month),
            2 => Ok(ChartType::ThreeMonths),
            3 => Ok(ChartType::Year),
            4 => Ok(ChartType::ThreeYears),
            other => Err(BackendError::InvalidChartType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_type_codes() {
        for code in 0..5 {
            assert_eq!(ChartType::try_from(code).unwrap().code(), code);
        }
        assert!(matches!(
            ChartType::try_from(9),
            Err(BackendError::InvalidChartType(9))
        ));
    }

    #[test]
    fn chart_windows() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(ChartType::Intraday.from_date(today), None);
        assert_eq!(
            ChartType::Month.from_date(today),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(
            ChartType::ThreeMonths.from_date(today),
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(
            ChartType::Year.from_date(today),
            NaiveDate::from_ymd_opt(2023, 3, 31)
        );
        assert_eq!(
            ChartType::ThreeYears.from_date(today),
            NaiveDate::from_ymd_opt(2021, 3, 31)
        );
    }
}
