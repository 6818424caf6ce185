//! Table definitions
//!
//! Single source of truth for table and column names. Bootstrap DDL and the
//! column lists used by the repositories are both generated from here, so a
//! column added to a table shows up in every SELECT/INSERT at once.

/// One column: name plus its full SQL definition
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub definition: &'static str,
}

const fn col(name: &'static str, definition: &'static str) -> Column {
    Column { name, definition }
}

/// One table
#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    /// `a, b, c` in declaration order
    pub fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `$1, $2, ...` matching [`Table::column_list`]
    pub fn placeholders(&self) -> String {
        (1..=self.columns.len())
            .map(|i| format!("${}", i))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `b = EXCLUDED.b, ...` for every column except `key`
    pub fn excluded_assignments(&self, key: &str) -> String {
        self.columns
            .iter()
            .filter(|c| c.name != key)
            .map(|c| format!("{0} = EXCLUDED.{0}", c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {} {}", c.name, c.definition))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", self.name, columns)
    }

    pub fn select_sql(&self) -> String {
        format!("SELECT {} FROM {}", self.column_list(), self.name)
    }

    pub fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            self.column_list(),
            self.placeholders()
        )
    }
}

pub const PATIENTS: Table = Table {
    name: "patients",
    columns: &[
        col("id", "TEXT PRIMARY KEY"),
        col("last_name", "TEXT NOT NULL"),
        col("first_name", "TEXT NOT NULL"),
        col("gender", "TEXT NOT NULL"),
        col("date_of_birth", "DATE NOT NULL"),
        col("email", "TEXT"),
        col("phone_number", "TEXT"),
        col("street", "TEXT"),
        col("house_number", "TEXT"),
        col("zip", "INTEGER"),
        col("city", "TEXT"),
        col("insurance_company", "TEXT"),
        col("insurance_membership_number", "TEXT"),
        col("confirmed", "BOOLEAN NOT NULL DEFAULT FALSE"),
        col("flu_immunization", "BOOLEAN"),
        col("speed_of_symptoms_outbreak", "TEXT"),
        col("symptoms", "TEXT"),
        col("corona_contacts", "BOOLEAN"),
        col("risk_areas", "TEXT"),
        col("weakened_immune_system", "BOOLEAN"),
        col("pre_illnesses", "TEXT"),
        col("risk_occupation", "TEXT"),
        col("comment", "TEXT"),
        col("occupation", "TEXT"),
    ],
};

pub const PATIENT_EVENTS: Table = Table {
    name: "patient_events",
    columns: &[
        col("id", "UUID PRIMARY KEY"),
        col("patient_id", "TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE"),
        col("event_type", "TEXT NOT NULL"),
        col("event_timestamp", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
        col("comment", "TEXT"),
    ],
};

pub const QUARANTINE_INCIDENTS: Table = Table {
    name: "quarantine_incidents",
    columns: &[
        col("id", "UUID PRIMARY KEY"),
        col("patient_id", "TEXT NOT NULL REFERENCES patients(id)"),
        col("event_date", "DATE NOT NULL"),
        col("until_date", "DATE"),
        col("comment", "TEXT"),
        col("updated_at", "TIMESTAMPTZ NOT NULL DEFAULT NOW()"),
    ],
};

/// Tables in creation order (referenced tables first)
pub const TABLES: &[Table] = &[PATIENTS, PATIENT_EVENTS, QUARANTINE_INCIDENTS];

/// Secondary indexes
pub const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(last_name, first_name, id)",
    "CREATE INDEX IF NOT EXISTS idx_patient_events_patient ON patient_events(patient_id)",
    "CREATE INDEX IF NOT EXISTS idx_quarantine_incidents_patient ON quarantine_incidents(patient_id)",
    "CREATE INDEX IF NOT EXISTS idx_quarantine_incidents_date ON quarantine_incidents(event_date, id)",
];
