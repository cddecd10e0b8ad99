use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::try_join_all;
use shared::domain::{Confidence, PatientId, Priority, Report, ReportId, ReportStatus};
use tracing::info;

/// Supplies the ordered report collection at session start.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Report>>;
}

/// The built-in mock catalog, or any fixed set handed in by the caller.
#[derive(Debug, Clone)]
pub struct StaticRecordSource {
    reports: Vec<Report>,
}

impl StaticRecordSource {
    pub fn new(reports: Vec<Report>) -> Self {
        Self { reports }
    }

    pub fn mock_catalog() -> Self {
        Self::new(mock_reports())
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    async fn load(&self) -> Result<Vec<Report>> {
        Ok(self.reports.clone())
    }
}

/// Reads a JSON array of reports from disk.
#[derive(Debug, Clone)]
pub struct JsonFileRecordSource {
    path: PathBuf,
}

impl JsonFileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for JsonFileRecordSource {
    async fn load(&self) -> Result<Vec<Report>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read reports from '{}'", self.path.display()))?;
        let reports: Vec<Report> = serde_json::from_str(&raw)
            .with_context(|| format!("malformed report file '{}'", self.path.display()))?;
        info!(path = %self.path.display(), count = reports.len(), "loaded reports from file");
        Ok(reports)
    }
}

/// Loads several sources concurrently and concatenates them in the order they
/// were added. Any failing source fails the whole load.
#[derive(Default, Clone)]
pub struct ChainedRecordSource {
    sources: Vec<Arc<dyn RecordSource>>,
}

impl ChainedRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.sources.push(source);
        self
    }
}

#[async_trait]
impl RecordSource for ChainedRecordSource {
    async fn load(&self) -> Result<Vec<Report>> {
        let batches = try_join_all(self.sources.iter().map(|s| s.load())).await?;
        Ok(batches.into_iter().flatten().collect())
    }
}

struct MockRow {
    id: &'static str,
    patient_name: &'static str,
    patient_id: &'static str,
    scan_type: &'static str,
    created_on: (i32, u32, u32),
    status: ReportStatus,
    confidence: u8,
    findings: &'static str,
    priority: Priority,
    reviewed_by: &'static str,
    file_size: &'static str,
}

const MOCK_ROWS: [MockRow; 5] = [
    MockRow {
        id: "RPT001",
        patient_name: "John Smith",
        patient_id: "PT001",
        scan_type: "Chest CT",
        created_on: (2024, 1, 15),
        status: ReportStatus::Completed,
        confidence: 98,
        findings: "No abnormalities detected. Lungs appear clear with normal cardiac silhouette.",
        priority: Priority::Normal,
        reviewed_by: "Dr. Johnson",
        file_size: "2.3 MB",
    },
    MockRow {
        id: "RPT002",
        patient_name: "Sarah Wilson",
        patient_id: "PT002",
        scan_type: "Brain MRI",
        created_on: (2024, 1, 14),
        status: ReportStatus::UnderReview,
        confidence: 85,
        findings: "Small hyperintense lesion detected in frontal lobe. Recommend further evaluation.",
        priority: Priority::High,
        reviewed_by: "Pending",
        file_size: "4.7 MB",
    },
    MockRow {
        id: "RPT003",
        patient_name: "Mike Davis",
        patient_id: "PT003",
        scan_type: "Abdominal CT",
        created_on: (2024, 1, 13),
        status: ReportStatus::Completed,
        confidence: 92,
        findings: "Mild hepatic steatosis observed. Inflammatory changes in ascending colon.",
        priority: Priority::Medium,
        reviewed_by: "Dr. Smith",
        file_size: "3.1 MB",
    },
    MockRow {
        id: "RPT004",
        patient_name: "Emma Brown",
        patient_id: "PT004",
        scan_type: "Spine X-Ray",
        created_on: (2024, 1, 12),
        status: ReportStatus::Draft,
        confidence: 94,
        findings: "Degenerative changes at L4-L5 level. No acute fractures detected.",
        priority: Priority::Normal,
        reviewed_by: "Dr. Johnson",
        file_size: "1.8 MB",
    },
    MockRow {
        id: "RPT005",
        patient_name: "Robert Taylor",
        patient_id: "PT005",
        scan_type: "Chest X-Ray",
        created_on: (2024, 1, 11),
        status: ReportStatus::Completed,
        confidence: 96,
        findings: "Normal chest radiograph. No acute cardiopulmonary abnormalities.",
        priority: Priority::Normal,
        reviewed_by: "Dr. Wilson",
        file_size: "1.2 MB",
    },
];

/// The five demo reports shown on the listing page.
pub fn mock_reports() -> Vec<Report> {
    MOCK_ROWS
        .iter()
        .filter_map(|row| {
            let (y, m, d) = row.created_on;
            Some(Report {
                id: ReportId::new(row.id),
                patient_name: row.patient_name.to_string(),
                patient_id: PatientId::new(row.patient_id),
                scan_type: row.scan_type.to_string(),
                created_on: NaiveDate::from_ymd_opt(y, m, d)?,
                status: row.status,
                confidence: Confidence::try_from(row.confidence).ok()?,
                findings: row.findings.to_string(),
                priority: row.priority,
                reviewed_by: row.reviewed_by.to_string(),
                file_size: Some(row.file_size.to_string()),
            })
        })
        .collect()
}
