pub mod forecast_record;
pub mod forecast_table;
pub mod raw_forecast;
pub mod table_format;
