use std::sync::Arc;

use crate::config::ReportConfig;
use crate::external::price_provider::PriceProvider;
use crate::services::chart_service::ChartRenderer;
use crate::services::news_service::NewsProvider;
use crate::services::notification_service::NotificationDispatcher;
use crate::services::report_service::ReportAssembler;

/// Everything one report run needs, wired up once at startup and shared with
/// the scheduler behind an `Arc`.
pub struct ReportContext {
    pub config: ReportConfig,
    pub price_provider: Arc<dyn PriceProvider>,
    pub news_provider: Option<Arc<dyn NewsProvider>>,
    pub news_items: usize,
    pub charts: ChartRenderer,
    pub assembler: ReportAssembler,
    pub dispatcher: NotificationDispatcher,
}
