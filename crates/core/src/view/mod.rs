pub mod chart;
pub mod feedback;
pub mod format;
pub mod kpi;
pub mod table;
