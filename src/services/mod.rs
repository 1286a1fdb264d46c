pub mod chart_service;
pub mod market_data_service;
pub mod news_service;
pub mod notification_service;
pub mod report_service;
pub mod returns_service;
pub mod scheduler_service;
pub mod template;
