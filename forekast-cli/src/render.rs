use chrono::Local;
use forekast_core::{Location, WeatherData, WeatherResult};

/// One line per tracked location: name, then either conditions or the failure.
pub fn summary_line(location: &Location, result: &WeatherResult) -> String {
    let head = location_line(location);
    match result {
        Ok(data) => format!(
            "{head}: {:.1}°C, {}",
            data.current.temperature_c, data.current.condition.text
        ),
        Err(err) => format!("{head}: unavailable ({})", err.user_message()),
    }
}

pub fn location_line(location: &Location) -> String {
    format!("[{}] {}", location.id, location.display_name())
}

pub fn details(location: &Location, data: &WeatherData) -> String {
    let current = &data.current;
    let mut out = vec![location.display_name()];

    out.push(format!("  Temperature:  {:.1}°C", current.temperature_c));
    if let Some(feels) = current.feels_like_c {
        out.push(format!("  Feels like:   {feels:.1}°C"));
    }
    let condition = match current.condition.code {
        Some(code) => format!("{} (code {})", current.condition.text, code.code()),
        None => current.condition.text.clone(),
    };
    out.push(format!("  Condition:    {condition}"));
    if let Some(humidity) = current.humidity {
        out.push(format!("  Humidity:     {humidity}%"));
    }
    if let Some(wind) = current.wind_speed_mps() {
        out.push(format!("  Wind:         {wind:.1} m/s"));
    }
    if let Some(is_day) = current.is_day {
        out.push(format!("  Daylight:     {}", if is_day { "yes" } else { "no" }));
    }
    if let Some(updated) = current.last_updated() {
        out.push(format!(
            "  Updated:      {}",
            updated.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        ));
    }

    if let Some(forecast) = data.forecast.as_ref().filter(|f| !f.forecastday.is_empty()) {
        out.push("  Forecast:".to_string());
        for day in &forecast.forecastday {
            let rain = day
                .day
                .daily_chance_of_rain
                .map(|p| format!(", {p}% rain"))
                .unwrap_or_default();
            out.push(format!(
                "    {}  {:>5.1} / {:>5.1}°C  {}{rain}",
                day.date.format("%a %d %b"),
                day.day.mintemp_c,
                day.day.maxtemp_c,
                day.day.condition.text,
            ));
        }
    }

    out.join("\n")
}
