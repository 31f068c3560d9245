//! Formatting for the details screen.

use std::fmt;

use crate::CurrentWeather;

/// One rendered details screen; each field already carries its label and unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherDetails {
    pub temperature: String,
    pub wind_speed: String,
    pub wind_direction: String,
    pub weather_code: String,
    pub is_day: String,
    pub time: String,
}

impl WeatherDetails {
    pub fn lines(&self) -> [&str; 6] {
        [
            self.temperature.as_str(),
            self.wind_speed.as_str(),
            self.wind_direction.as_str(),
            self.weather_code.as_str(),
            self.is_day.as_str(),
            self.time.as_str(),
        ]
    }
}

impl fmt::Display for WeatherDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Absent weather renders as zeros and an empty time.
pub fn render(weather: Option<&CurrentWeather>) -> WeatherDetails {
    let temperature = weather.map_or(0.0, |w| w.temperature);
    let windspeed = weather.map_or(0.0, |w| w.windspeed);
    let winddirection = weather.map_or(0, |w| w.winddirection);
    let weathercode = weather.map_or(0, |w| w.weathercode);
    let is_day = weather.map_or(0, |w| w.is_day);
    let time = weather.map_or("", |w| w.time.as_str());

    WeatherDetails {
        temperature: format!("Temperature: {temperature:.1} °C"),
        wind_speed: format!("Wind speed: {windspeed:.1} km/h"),
        wind_direction: format!("Wind direction: {winddirection}°"),
        weather_code: format!("Weather code: {weathercode} ({})", describe_weather_code(weathercode)),
        is_day: format!("Is day: {is_day}"),
        time: format!("Time: {time}"),
    }
}

/// WMO weather interpretation code, see https://open-meteo.com/en/docs#weathervariables
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zagreb_noon() -> CurrentWeather {
        CurrentWeather {
            temperature: 21.3,
            windspeed: 5.1,
            winddirection: 180,
            weathercode: 1,
            is_day: 1,
            time: "2024-01-01T12:00".to_string(),
        }
    }

    #[test]
    fn renders_every_field_with_label() {
        let details = render(Some(&zagreb_noon()));

        assert_eq!(details.temperature, "Temperature: 21.3 °C");
        assert_eq!(details.wind_speed, "Wind speed: 5.1 km/h");
        assert_eq!(details.wind_direction, "Wind direction: 180°");
        assert_eq!(details.weather_code, "Weather code: 1 (Mainly clear)");
        assert_eq!(details.is_day, "Is day: 1");
        assert_eq!(details.time, "Time: 2024-01-01T12:00");
    }

    #[test]
    fn absent_weather_renders_defaults() {
        let details = render(None);

        assert_eq!(details.temperature, "Temperature: 0.0 °C");
        assert_eq!(details.wind_direction, "Wind direction: 0°");
        assert_eq!(details.is_day, "Is day: 0");
        assert_eq!(details.time, "Time: ");
    }

    #[test]
    fn display_prints_one_line_per_field() {
        let text = render(Some(&zagreb_noon())).to_string();
        assert_eq!(text.lines().count(), 6);
    }

    #[test]
    fn unknown_codes_are_labelled() {
        assert_eq!(describe_weather_code(42), "Unknown");
        assert_eq!(describe_weather_code(81), "Rain showers");
    }
}
