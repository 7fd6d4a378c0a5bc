//! Tools registered by the default runtime.

pub mod weather;

pub use weather::{
    AmapWeatherSource, CityCodeLookup, LiveWeather, WEATHER_TOOL_NAME, WeatherSource, WeatherTool,
    weather_definition,
};
