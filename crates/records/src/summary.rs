use shared::domain::{Priority, Report, ReportStatus};

/// Dashboard headline numbers derived from a report set.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    pub total: usize,
    pub drafts: usize,
    pub under_review: usize,
    pub completed: usize,
    pub high_priority: usize,
    pub mean_confidence: Option<f64>,
}

impl ReportSummary {
    pub fn from_reports(reports: &[Report]) -> Self {
        let count = |status: ReportStatus| reports.iter().filter(|r| r.status == status).count();
        let mean_confidence = if reports.is_empty() {
            None
        } else {
            let sum: u32 = reports
                .iter()
                .map(|r| u32::from(r.confidence.value()))
                .sum();
            Some(f64::from(sum) / reports.len() as f64)
        };

        Self {
            total: reports.len(),
            drafts: count(ReportStatus::Draft),
            under_review: count(ReportStatus::UnderReview),
            completed: count(ReportStatus::Completed),
            high_priority: reports
                .iter()
                .filter(|r| r.priority == Priority::High)
                .count(),
            mean_confidence,
        }
    }

    /// Reports still waiting on a reviewer.
    pub fn pending_reviews(&self) -> usize {
        self.drafts + self.under_review
    }
}
