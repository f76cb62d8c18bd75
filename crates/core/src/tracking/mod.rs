pub mod infrastructure;
pub mod stop_control;
pub mod track_lights_use_case;
pub mod tracking_logger;
