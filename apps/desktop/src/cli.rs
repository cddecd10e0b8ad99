use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use records::ALL;

#[derive(Parser, Debug)]
#[command(name = "desktop", version, about = "RadAssist operator console")]
pub struct Cli {
    #[arg(long, global = true, help = "Config file (defaults to ./desktop.toml if present)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List reports matching the given filters.
    Reports {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = ALL)]
        status: String,
        #[arg(long = "type", default_value = ALL)]
        category: String,
        #[arg(long, help = "JSON report file instead of the built-in catalog")]
        source: Option<PathBuf>,
    },
    /// Dashboard counts over the report set.
    Summary {
        #[arg(long)]
        source: Option<PathBuf>,
    },
    Login(LoginArgs),
    Contact(ContactArgs),
    Upload(UploadArgs),
    /// Edit the operator profile.
    Profile {
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        set: Vec<String>,
        #[arg(long, help = "Discard the edits instead of saving them")]
        cancel: bool,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Reports { .. } => "reports",
            Command::Summary { .. } => "summary",
            Command::Login(_) => "login",
            Command::Contact(_) => "contact",
            Command::Upload(_) => "upload",
            Command::Profile { .. } => "profile",
        }
    }
}

// Form arguments are plain strings so that required-field checks happen in
// the form itself rather than in argument parsing.

#[derive(Args, Debug, Default)]
pub struct LoginArgs {
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value = "")]
    pub password: String,
}

#[derive(Args, Debug, Default)]
pub struct ContactArgs {
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
    #[arg(long, default_value = "")]
    pub email: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub organization: String,
    #[arg(long, default_value = "")]
    pub inquiry_type: String,
    #[arg(long, default_value = "")]
    pub subject: String,
    #[arg(long, default_value = "")]
    pub message: String,
}

#[derive(Args, Debug, Default)]
pub struct UploadArgs {
    #[arg(long = "file", default_value = "")]
    pub scan_file: String,
    #[arg(long, default_value = "")]
    pub patient_name: String,
    #[arg(long, default_value = "")]
    pub patient_id: String,
    #[arg(long, default_value = "")]
    pub date_of_birth: String,
    #[arg(long, default_value = "")]
    pub scan_type: String,
    #[arg(long, default_value = "")]
    pub body_part: String,
    #[arg(long, default_value = "")]
    pub urgency: String,
    #[arg(long, default_value = "")]
    pub clinical_history: String,
    #[arg(long, default_value = "")]
    pub symptoms: String,
}

impl LoginArgs {
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![("email", self.email.as_str()), ("password", self.password.as_str())]
    }
}

impl ContactArgs {
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("first_name", self.first_name.as_str()),
            ("last_name", self.last_name.as_str()),
            ("email", self.email.as_str()),
            ("phone", self.phone.as_str()),
            ("organization", self.organization.as_str()),
            ("inquiry_type", self.inquiry_type.as_str()),
            ("subject", self.subject.as_str()),
            ("message", self.message.as_str()),
        ]
    }
}

impl UploadArgs {
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("scan_file", self.scan_file.as_str()),
            ("patient_name", self.patient_name.as_str()),
            ("patient_id", self.patient_id.as_str()),
            ("date_of_birth", self.date_of_birth.as_str()),
            ("scan_type", self.scan_type.as_str()),
            ("body_part", self.body_part.as_str()),
            ("urgency", self.urgency.as_str()),
            ("clinical_history", self.clinical_history.as_str()),
            ("symptoms", self.symptoms.as_str()),
        ]
    }
}

/// Splits `field=value`; the value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> anyhow::Result<(&str, &str)> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim(), v))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| anyhow::anyhow!("expected FIELD=VALUE, got '{raw}'"))
}
