pub use self::{
    cache_refresher::cache_refresh_task,
    report::{load_report, ReportSequencer},
};

mod cache_refresher;
mod report;
