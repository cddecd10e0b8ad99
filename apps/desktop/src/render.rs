//! Console output for reports and form results.

use anyhow::Result;
use client_core::{Draft, ProfileDraft, UiEvent};
use records::{QueryOutcome, ReportSummary};
use serde_json::json;
use shared::protocol::{NoticeKind, OperationPayload};

use crate::orchestration::FormOutcome;

pub fn reports(outcome: &QueryOutcome<'_>, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(outcome.reports())?);
        return Ok(());
    }

    match outcome {
        QueryOutcome::Empty => {
            println!("No reports match the current filters.");
            println!("Clear filters: drop --search, --status and --type.");
        }
        QueryOutcome::Matches(reports) => {
            for r in reports {
                println!(
                    "{:<7} {:<14} {:<6} {:<13} {} {:<12} {:>4} {:<6} {}",
                    r.id,
                    r.patient_name,
                    r.patient_id,
                    r.scan_type,
                    r.created_on,
                    r.status,
                    r.confidence.to_string(),
                    r.priority,
                    r.reviewed_by
                );
            }
            println!("{} report(s)", reports.len());
        }
    }
    Ok(())
}

pub fn summary(summary: &ReportSummary, as_json: bool) -> Result<()> {
    let mean = summary.mean_confidence.map(|m| (m * 10.0).round() / 10.0);
    if as_json {
        let value = json!({
            "total": summary.total,
            "draft": summary.drafts,
            "under_review": summary.under_review,
            "completed": summary.completed,
            "pending_reviews": summary.pending_reviews(),
            "high_priority": summary.high_priority,
            "mean_confidence": mean,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Total scans:      {}", summary.total);
    println!("Pending reviews:  {}", summary.pending_reviews());
    println!("Completed:        {}", summary.completed);
    println!("High priority:    {}", summary.high_priority);
    match mean {
        Some(mean) => println!("Mean confidence:  {mean}%"),
        None => println!("Mean confidence:  n/a"),
    }
    Ok(())
}

pub fn form_outcome(form: &str, outcome: &FormOutcome, as_json: bool) -> Result<()> {
    if as_json {
        let value = match outcome {
            FormOutcome::Invalid(err) => json!({
                "form": form,
                "result": "invalid",
                "fields": err
                    .fields
                    .iter()
                    .map(|f| json!({ "field": f.field, "problem": f.problem }))
                    .collect::<Vec<_>>(),
            }),
            FormOutcome::Cancelled => json!({ "form": form, "result": "cancelled" }),
            FormOutcome::Resolved {
                state,
                events,
                payload,
            } => {
                let result = if outcome.succeeded() {
                    "success"
                } else {
                    "failure"
                };
                json!({
                    "form": form,
                    "result": result,
                    "state": format!("{state:?}").to_lowercase(),
                    "events": events.iter().map(event_json).collect::<Vec<_>>(),
                    "payload": payload,
                })
            }
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match outcome {
        FormOutcome::Invalid(err) => {
            println!("{form}: not submitted");
            for field in &err.fields {
                println!("  {} {}", field.field, field.problem);
            }
        }
        FormOutcome::Cancelled => println!("{form}: edits discarded"),
        FormOutcome::Resolved {
            events, payload, ..
        } => {
            for event in events {
                match event {
                    UiEvent::Notice(notice) => {
                        let tag = match notice.kind {
                            NoticeKind::Success => "ok",
                            NoticeKind::Error => "error",
                        };
                        println!("[{tag}] {}: {}", notice.title, notice.description);
                    }
                    UiEvent::Navigate(route) => println!("-> {route}"),
                }
            }
            if let Some(OperationPayload::UploadReceipt { receipt_id }) = payload {
                println!("receipt {receipt_id}");
            }
        }
    }
    Ok(())
}

fn event_json(event: &UiEvent) -> serde_json::Value {
    match event {
        UiEvent::Notice(notice) => json!({ "notice": notice }),
        UiEvent::Navigate(route) => json!({ "navigate": route.path() }),
    }
}

pub fn profile(profile: &ProfileDraft, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }
    for key in ProfileDraft::FIELDS {
        println!("{key:<15} {}", profile.field(key).unwrap_or_default());
    }
    Ok(())
}
