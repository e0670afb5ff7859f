use serde::Deserialize;

use crate::scrape::ScrapeError;

const FORECAST_URL: &str = "https://api.weather.com/v3/wx/forecast/daily/15day";

/// weather.com daily-forecast client. Temperatures are imperial (°F).
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
}

impl WeatherClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        WeatherClient {
            http,
            api_key: api_key.into(),
        }
    }

    /// Forecast high/low for `date` (`YYYY-MM-DD`) at the given
    /// coordinates. `None` when the date falls outside the 15-day window
    /// or the provider has no reading for it.
    pub async fn day_temperatures(
        &self,
        lat: f64,
        lng: f64,
        date: &str,
    ) -> Result<Option<(i64, i64)>, ScrapeError> {
        let response = self
            .http
            .get(FORECAST_URL)
            .query(&[
                ("geocode", format!("{lat},{lng}").as_str()),
                ("units", "e"),
                ("language", "en-US"),
                ("format", "json"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let forecast: DailyForecast = response.json().await?;
        Ok(forecast.for_date(date))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyForecast {
    valid_time_local: Vec<String>,
    calendar_day_temperature_max: Vec<Option<i64>>,
    calendar_day_temperature_min: Vec<Option<i64>>,
}

impl DailyForecast {
    fn for_date(&self, date: &str) -> Option<(i64, i64)> {
        let index = self
            .valid_time_local
            .iter()
            .position(|t| t.starts_with(date))?;
        let max = (*self.calendar_day_temperature_max.get(index)?)?;
        let min = (*self.calendar_day_temperature_min.get(index)?)?;
        Some((max, min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast() -> DailyForecast {
        serde_json::from_value(serde_json::json!({
            "validTimeLocal": [
                "2026-09-01T07:00:00-0700",
                "2026-09-02T07:00:00-0700",
                "2026-09-03T07:00:00-0700",
            ],
            "calendarDayTemperatureMax": [81, 79, null],
            "calendarDayTemperatureMin": [55, 54, 53],
        }))
        .unwrap()
    }

    #[test]
    fn picks_the_matching_day() {
        assert_eq!(forecast().for_date("2026-09-02"), Some((79, 54)));
    }

    #[test]
    fn out_of_window_dates_have_no_reading() {
        assert_eq!(forecast().for_date("2026-10-01"), None);
    }

    #[test]
    fn null_readings_have_no_reading() {
        assert_eq!(forecast().for_date("2026-09-03"), None);
    }
}
