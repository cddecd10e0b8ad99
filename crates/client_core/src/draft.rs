//! Editable form values. Every field is free text until submit-time validation.

use serde::{Deserialize, Serialize};
use shared::error::{FieldKey, UnknownField};

pub trait Draft: Clone + Default + Send + Sync + 'static {
    /// Field keys in display order.
    const FIELDS: &'static [FieldKey];

    fn field(&self, key: &str) -> Option<&str>;

    fn set_field(&mut self, key: &str, value: String) -> Result<(), UnknownField>;

    /// A field counts as filled when it has non-whitespace content.
    fn is_filled(&self, key: &str) -> bool {
        self.field(key).is_some_and(|v| !v.trim().is_empty())
    }
}

macro_rules! form_draft {
    ($(#[$meta:meta])* $name:ident { $($field:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(pub $field: String,)+
        }

        impl Draft for $name {
            const FIELDS: &'static [FieldKey] = &[$(stringify!($field)),+];

            fn field(&self, key: &str) -> Option<&str> {
                match key {
                    $(stringify!($field) => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }

            fn set_field(&mut self, key: &str, value: String) -> Result<(), UnknownField> {
                match key {
                    $(stringify!($field) => {
                        self.$field = value;
                        Ok(())
                    })+
                    _ => Err(UnknownField(key.to_string())),
                }
            }
        }
    };
}

form_draft!(
    /// Sign-in credentials.
    LoginDraft { email, password }
);

form_draft!(
    /// Public contact form.
    ContactDraft {
        first_name,
        last_name,
        email,
        phone,
        organization,
        inquiry_type,
        subject,
        message,
    }
);

form_draft!(
    /// Scan upload: the chosen file plus patient and clinical details.
    UploadDraft {
        scan_file,
        patient_name,
        patient_id,
        date_of_birth,
        scan_type,
        body_part,
        urgency,
        clinical_history,
        symptoms,
    }
);

form_draft!(
    /// Operator profile.
    ProfileDraft {
        first_name,
        last_name,
        email,
        phone,
        license,
        specialization,
        hospital,
        department,
        experience,
        location,
        bio,
    }
);

impl ProfileDraft {
    /// The demo operator profile shown before any edits.
    pub fn sample() -> Self {
        Self {
            first_name: "Dr. Sarah".into(),
            last_name: "Johnson".into(),
            email: "sarah.johnson@hospital.com".into(),
            phone: "+1 (555) 123-4567".into(),
            license: "MD-12345".into(),
            specialization: "Diagnostic Radiology".into(),
            hospital: "Metropolitan Medical Center".into(),
            department: "Radiology Department".into(),
            experience: "15 years".into(),
            location: "New York, NY".into(),
            bio: "Board-certified radiologist specializing in diagnostic imaging with expertise \
                  in CT, MRI, and interventional procedures."
                .into(),
        }
    }
}

pub const ACCEPTED_SCAN_EXTENSIONS: [&str; 5] = ["dcm", "jpg", "jpeg", "png", "tiff"];

impl UploadDraft {
    pub fn has_accepted_extension(&self) -> bool {
        self.scan_file
            .trim()
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| ACCEPTED_SCAN_EXTENSIONS.contains(&ext.as_str()))
    }
}
