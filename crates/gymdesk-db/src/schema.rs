//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs and calendar dates (`YYYY-MM-DD`) are
//! stored as strings, money as integer cents, and enums as their variant
//! names guarded by ASSERT constraints.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Units (global scope, one per gym location)
-- =======================================================================
DEFINE TABLE unit SCHEMAFULL;
DEFINE FIELD name ON TABLE unit TYPE string;
DEFINE FIELD slug ON TABLE unit TYPE string;
DEFINE FIELD cnpj ON TABLE unit TYPE option<string>;
DEFINE FIELD phone ON TABLE unit TYPE option<string>;
DEFINE FIELD email ON TABLE unit TYPE option<string>;
DEFINE FIELD address ON TABLE unit TYPE option<string>;
DEFINE FIELD primary_color ON TABLE unit TYPE string;
DEFINE FIELD logo_url ON TABLE unit TYPE option<string>;
DEFINE FIELD contract_template ON TABLE unit TYPE option<string>;
DEFINE FIELD metadata ON TABLE unit TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE unit TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE unit TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_unit_slug ON TABLE unit COLUMNS slug UNIQUE;

-- =======================================================================
-- Staff members (unit scope)
-- =======================================================================
DEFINE TABLE staff SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE staff TYPE string;
DEFINE FIELD name ON TABLE staff TYPE string;
DEFINE FIELD email ON TABLE staff TYPE string;
DEFINE FIELD password_hash ON TABLE staff TYPE string;
DEFINE FIELD role ON TABLE staff TYPE string \
    ASSERT $value IN ['Owner', 'Manager', 'Instructor', 'Receptionist'];
DEFINE FIELD status ON TABLE staff TYPE string \
    ASSERT $value IN ['Active', 'Inactive'];
DEFINE FIELD created_at ON TABLE staff TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE staff TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_staff_unit_email ON TABLE staff \
    COLUMNS unit_id, email UNIQUE;

-- =======================================================================
-- Sessions (unit scope)
-- =======================================================================
DEFINE TABLE session SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE session TYPE string;
DEFINE FIELD staff_id ON TABLE session TYPE string;
DEFINE FIELD token_hash ON TABLE session TYPE string;
DEFINE FIELD ip_address ON TABLE session TYPE option<string>;
DEFINE FIELD user_agent ON TABLE session TYPE option<string>;
DEFINE FIELD expires_at ON TABLE session TYPE datetime;
DEFINE FIELD created_at ON TABLE session TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_session_token ON TABLE session \
    COLUMNS unit_id, token_hash UNIQUE;
DEFINE INDEX idx_session_unit_staff ON TABLE session \
    COLUMNS unit_id, staff_id;

-- =======================================================================
-- Leads (unit scope, CRM pipeline)
-- =======================================================================
DEFINE TABLE lead SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE lead TYPE string;
DEFINE FIELD name ON TABLE lead TYPE string;
DEFINE FIELD email ON TABLE lead TYPE option<string>;
DEFINE FIELD phone ON TABLE lead TYPE option<string>;
DEFINE FIELD cpf ON TABLE lead TYPE option<string>;
DEFINE FIELD birth_date ON TABLE lead TYPE option<string>;
DEFINE FIELD sex ON TABLE lead TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['Male', 'Female'];
DEFINE FIELD source ON TABLE lead TYPE option<string>;
DEFINE FIELD status ON TABLE lead TYPE string \
    ASSERT $value IN ['Lead', 'VisitScheduled', 'Negotiation', 'Active', \
    'Inactive', 'Cancelled'];
DEFINE FIELD plan_id ON TABLE lead TYPE option<string>;
DEFINE FIELD assigned_to ON TABLE lead TYPE option<string>;
DEFINE FIELD notes ON TABLE lead TYPE option<string>;
DEFINE FIELD tags ON TABLE lead TYPE array<string> DEFAULT [];
DEFINE FIELD created_at ON TABLE lead TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE lead TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_lead_unit_status ON TABLE lead COLUMNS unit_id, status;
DEFINE INDEX idx_lead_unit_cpf ON TABLE lead COLUMNS unit_id, cpf;

-- =======================================================================
-- Check-ins (unit scope)
-- =======================================================================
DEFINE TABLE check_in SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE check_in TYPE string;
DEFINE FIELD lead_id ON TABLE check_in TYPE string;
DEFINE FIELD method ON TABLE check_in TYPE string \
    ASSERT $value IN ['Manual', 'QrCode'];
DEFINE FIELD checked_in_at ON TABLE check_in TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD notes ON TABLE check_in TYPE option<string>;
DEFINE INDEX idx_check_in_unit_time ON TABLE check_in \
    COLUMNS unit_id, checked_in_at;
DEFINE INDEX idx_check_in_lead ON TABLE check_in COLUMNS unit_id, lead_id;

-- =======================================================================
-- Workouts and their ordered exercises (unit scope)
-- =======================================================================
DEFINE TABLE workout SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE workout TYPE string;
DEFINE FIELD lead_id ON TABLE workout TYPE string;
DEFINE FIELD name ON TABLE workout TYPE string;
DEFINE FIELD description ON TABLE workout TYPE option<string>;
DEFINE FIELD active ON TABLE workout TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE workout TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE workout TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_workout_lead ON TABLE workout COLUMNS unit_id, lead_id;

DEFINE TABLE workout_exercise SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE workout_exercise TYPE string;
DEFINE FIELD workout_id ON TABLE workout_exercise TYPE string;
DEFINE FIELD position ON TABLE workout_exercise TYPE int;
DEFINE FIELD name ON TABLE workout_exercise TYPE string;
DEFINE FIELD sets ON TABLE workout_exercise TYPE int ASSERT $value > 0;
DEFINE FIELD reps ON TABLE workout_exercise TYPE string;
DEFINE FIELD load_kg ON TABLE workout_exercise TYPE option<float>;
DEFINE FIELD rest_seconds ON TABLE workout_exercise TYPE option<int>;
DEFINE FIELD notes ON TABLE workout_exercise TYPE option<string>;
DEFINE INDEX idx_exercise_workout ON TABLE workout_exercise \
    COLUMNS workout_id, position UNIQUE;

-- =======================================================================
-- Appointments (unit scope)
-- =======================================================================
DEFINE TABLE appointment SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE appointment TYPE string;
DEFINE FIELD lead_id ON TABLE appointment TYPE option<string>;
DEFINE FIELD staff_id ON TABLE appointment TYPE option<string>;
DEFINE FIELD title ON TABLE appointment TYPE string;
DEFINE FIELD kind ON TABLE appointment TYPE string \
    ASSERT $value IN ['Visit', 'Assessment', 'Class', 'PersonalTraining', \
    'Other'];
DEFINE FIELD starts_at ON TABLE appointment TYPE datetime;
DEFINE FIELD ends_at ON TABLE appointment TYPE datetime;
DEFINE FIELD status ON TABLE appointment TYPE string \
    ASSERT $value IN ['Scheduled', 'Confirmed', 'Completed', 'Cancelled', \
    'NoShow'];
DEFINE FIELD notes ON TABLE appointment TYPE option<string>;
DEFINE FIELD created_at ON TABLE appointment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE appointment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_appointment_unit_start ON TABLE appointment \
    COLUMNS unit_id, starts_at;

-- =======================================================================
-- Plans and subscriptions (unit scope)
-- =======================================================================
DEFINE TABLE plan SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE plan TYPE string;
DEFINE FIELD name ON TABLE plan TYPE string;
DEFINE FIELD description ON TABLE plan TYPE option<string>;
DEFINE FIELD price_cents ON TABLE plan TYPE int ASSERT $value >= 0;
DEFINE FIELD billing_months ON TABLE plan TYPE int ASSERT $value > 0;
DEFINE FIELD active ON TABLE plan TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE plan TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE plan TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_plan_unit_name ON TABLE plan COLUMNS unit_id, name UNIQUE;

DEFINE TABLE subscription SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE subscription TYPE string;
DEFINE FIELD lead_id ON TABLE subscription TYPE string;
DEFINE FIELD plan_id ON TABLE subscription TYPE string;
DEFINE FIELD price_cents ON TABLE subscription TYPE int;
DEFINE FIELD billing_months ON TABLE subscription TYPE int \
    ASSERT $value > 0;
DEFINE FIELD starts_on ON TABLE subscription TYPE string;
DEFINE FIELD ends_on ON TABLE subscription TYPE option<string>;
DEFINE FIELD next_billing_on ON TABLE subscription TYPE string;
DEFINE FIELD status ON TABLE subscription TYPE string \
    ASSERT $value IN ['Active', 'Paused', 'Cancelled', 'Expired'];
DEFINE FIELD created_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE subscription TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_subscription_lead ON TABLE subscription \
    COLUMNS unit_id, lead_id;
DEFINE INDEX idx_subscription_billing ON TABLE subscription \
    COLUMNS unit_id, status, next_billing_on;

-- =======================================================================
-- Invoices (unit scope)
-- =======================================================================
DEFINE TABLE invoice SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE invoice TYPE string;
DEFINE FIELD lead_id ON TABLE invoice TYPE string;
DEFINE FIELD subscription_id ON TABLE invoice TYPE option<string>;
DEFINE FIELD description ON TABLE invoice TYPE string;
DEFINE FIELD amount_cents ON TABLE invoice TYPE int ASSERT $value > 0;
DEFINE FIELD discount_cents ON TABLE invoice TYPE int DEFAULT 0 \
    ASSERT $value >= 0;
DEFINE FIELD due_date ON TABLE invoice TYPE string;
DEFINE FIELD status ON TABLE invoice TYPE string \
    ASSERT $value IN ['Pending', 'Paid', 'Overdue', 'Cancelled'];
DEFINE FIELD paid_at ON TABLE invoice TYPE option<datetime>;
DEFINE FIELD payment_method ON TABLE invoice TYPE option<string> \
    ASSERT $value = NONE OR $value IN ['Cash', 'Pix', 'CreditCard', \
    'DebitCard', 'BankSlip'];
DEFINE FIELD created_at ON TABLE invoice TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE invoice TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_invoice_unit_due ON TABLE invoice COLUMNS unit_id, due_date;
DEFINE INDEX idx_invoice_lead ON TABLE invoice COLUMNS unit_id, lead_id;

-- =======================================================================
-- Contracts (unit scope)
-- =======================================================================
DEFINE TABLE contract SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE contract TYPE string;
DEFINE FIELD lead_id ON TABLE contract TYPE string;
DEFINE FIELD plan_id ON TABLE contract TYPE option<string>;
DEFINE FIELD body ON TABLE contract TYPE string;
DEFINE FIELD status ON TABLE contract TYPE string \
    ASSERT $value IN ['Draft', 'Sent', 'Signed', 'Cancelled'];
DEFINE FIELD signed_at ON TABLE contract TYPE option<datetime>;
DEFINE FIELD created_at ON TABLE contract TYPE datetime DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE contract TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_contract_lead ON TABLE contract COLUMNS unit_id, lead_id;

-- =======================================================================
-- Chat (unit scope)
-- =======================================================================
DEFINE TABLE chat_room SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE chat_room TYPE string;
DEFINE FIELD lead_id ON TABLE chat_room TYPE option<string>;
DEFINE FIELD name ON TABLE chat_room TYPE string;
DEFINE FIELD created_at ON TABLE chat_room TYPE datetime DEFAULT time::now();
DEFINE INDEX idx_chat_room_unit ON TABLE chat_room COLUMNS unit_id;

DEFINE TABLE chat_message SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE chat_message TYPE string;
DEFINE FIELD room_id ON TABLE chat_message TYPE string;
DEFINE FIELD sender_kind ON TABLE chat_message TYPE string \
    ASSERT $value IN ['Staff', 'Lead'];
DEFINE FIELD sender_id ON TABLE chat_message TYPE string;
DEFINE FIELD body ON TABLE chat_message TYPE string;
DEFINE FIELD created_at ON TABLE chat_message TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_chat_message_room ON TABLE chat_message \
    COLUMNS room_id, created_at;

-- =======================================================================
-- Automation rules and delivery log (unit scope)
-- =======================================================================
DEFINE TABLE automation_rule SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE automation_rule TYPE string;
DEFINE FIELD name ON TABLE automation_rule TYPE string;
DEFINE FIELD trigger_type ON TABLE automation_rule TYPE string \
    ASSERT $value IN ['Birthday', 'InactiveDays', 'WelcomeNewLead', \
    'InvoiceDue', 'InvoiceOverdue', 'SubscriptionExpiring'];
DEFINE FIELD day_offset ON TABLE automation_rule TYPE int DEFAULT 0;
DEFINE FIELD channel ON TABLE automation_rule TYPE string \
    ASSERT $value IN ['WhatsApp', 'Email', 'Sms'];
DEFINE FIELD template ON TABLE automation_rule TYPE string;
DEFINE FIELD active ON TABLE automation_rule TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE automation_rule TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE automation_rule TYPE datetime \
    DEFAULT time::now();

DEFINE TABLE automation_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD unit_id ON TABLE automation_log TYPE string;
DEFINE FIELD rule_id ON TABLE automation_log TYPE string;
DEFINE FIELD lead_id ON TABLE automation_log TYPE string;
DEFINE FIELD run_date ON TABLE automation_log TYPE string;
DEFINE FIELD channel ON TABLE automation_log TYPE string;
DEFINE FIELD message ON TABLE automation_log TYPE string;
DEFINE FIELD status ON TABLE automation_log TYPE string \
    ASSERT $value IN ['Sent', 'Failed', 'Skipped'];
DEFINE FIELD error ON TABLE automation_log TYPE option<string>;
DEFINE FIELD created_at ON TABLE automation_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_automation_log_run ON TABLE automation_log \
    COLUMNS rule_id, lead_id, run_date UNIQUE;

-- =======================================================================
-- Activity log (unit scope, append-only)
-- =======================================================================
DEFINE TABLE activity_log SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD unit_id ON TABLE activity_log TYPE string;
DEFINE FIELD actor_id ON TABLE activity_log TYPE option<string>;
DEFINE FIELD action ON TABLE activity_log TYPE string;
DEFINE FIELD entity_type ON TABLE activity_log TYPE string;
DEFINE FIELD entity_id ON TABLE activity_log TYPE option<string>;
DEFINE FIELD description ON TABLE activity_log TYPE string;
DEFINE FIELD metadata ON TABLE activity_log TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE activity_log TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_unit_time ON TABLE activity_log \
    COLUMNS unit_id, created_at;
DEFINE INDEX idx_activity_entity ON TABLE activity_log \
    COLUMNS unit_id, entity_type, entity_id;

-- =======================================================================
-- Physical assessments (unit scope)
-- =======================================================================
DEFINE TABLE assessment SCHEMAFULL;
DEFINE FIELD unit_id ON TABLE assessment TYPE string;
DEFINE FIELD lead_id ON TABLE assessment TYPE string;
DEFINE FIELD assessed_at ON TABLE assessment TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD sex ON TABLE assessment TYPE string \
    ASSERT $value IN ['Male', 'Female'];
DEFINE FIELD age ON TABLE assessment TYPE int;
DEFINE FIELD weight_kg ON TABLE assessment TYPE float ASSERT $value > 0;
DEFINE FIELD height_cm ON TABLE assessment TYPE float ASSERT $value > 0;
DEFINE FIELD protocol ON TABLE assessment TYPE string \
    ASSERT $value IN ['JacksonPollock3', 'JacksonPollock7', 'Guedes', \
    'None'];
DEFINE FIELD chest ON TABLE assessment TYPE option<float>;
DEFINE FIELD abdomen ON TABLE assessment TYPE option<float>;
DEFINE FIELD thigh ON TABLE assessment TYPE option<float>;
DEFINE FIELD triceps ON TABLE assessment TYPE option<float>;
DEFINE FIELD subscapular ON TABLE assessment TYPE option<float>;
DEFINE FIELD suprailiac ON TABLE assessment TYPE option<float>;
DEFINE FIELD midaxillary ON TABLE assessment TYPE option<float>;
DEFINE FIELD bmi ON TABLE assessment TYPE option<float>;
DEFINE FIELD body_density ON TABLE assessment TYPE option<float>;
DEFINE FIELD body_fat_percent ON TABLE assessment TYPE option<float>;
DEFINE FIELD fat_mass_kg ON TABLE assessment TYPE option<float>;
DEFINE FIELD lean_mass_kg ON TABLE assessment TYPE option<float>;
DEFINE FIELD notes ON TABLE assessment TYPE option<string>;
DEFINE FIELD created_at ON TABLE assessment TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_assessment_lead ON TABLE assessment \
    COLUMNS unit_id, lead_id, assessed_at;
";

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
