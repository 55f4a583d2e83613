use chrono::{NaiveDate, NaiveTime};

use appointment_cell::models::{BookingRecord, InsuranceCarrier};
use appointment_cell::services::consistency::reconcile;
use appointment_cell::LedgerService;
use patient_cell::{AppointmentDuration, PatientType};
use schedule_cell::{ScheduleSlot, SlotStatus};
use shared_utils::test_utils::TestClinic;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn record(name: &str, day: u32, hour: u32) -> BookingRecord {
    BookingRecord {
        patient_name: name.to_string(),
        date_of_birth: date(1985, 4, 12),
        patient_type: PatientType::Returning,
        doctor: "Dr. Smith".to_string(),
        location: "Main Street Clinic".to_string(),
        date: date(2024, 5, day),
        time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        duration: AppointmentDuration::ThirtyMinutes,
        email: Some("jane@example.com".to_string()),
        phone: None,
        insurance_carrier: Some(InsuranceCarrier::UnitedHealthcare),
        member_id: None,
        group_number: Some("G-7, east wing".to_string()),
    }
}

#[tokio::test]
async fn append_keeps_every_prior_record() {
    let clinic = TestClinic::new();
    let ledger = LedgerService::new(&clinic.config);

    let first = record("Jane Doe", 1, 10);
    let second = record("John Roe", 2, 10);
    ledger.append(&first).await.unwrap();
    ledger.append(&second).await.unwrap();

    assert_eq!(ledger.list(None).unwrap(), vec![first, second]);
}

#[test]
fn empty_ledger_lists_nothing() {
    let clinic = TestClinic::new();
    let ledger = LedgerService::new(&clinic.config);

    assert!(ledger.list(None).unwrap().is_empty());
    assert!(clinic.read_appointments().is_none());
}

#[tokio::test]
async fn list_from_date_skips_earlier_records() {
    let clinic = TestClinic::new();
    let ledger = LedgerService::new(&clinic.config);

    ledger.append(&record("Jane Doe", 1, 10)).await.unwrap();
    ledger.append(&record("John Roe", 3, 9)).await.unwrap();

    let upcoming = ledger.list(Some(date(2024, 5, 2))).unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].patient_name, "John Roe");
}

#[tokio::test]
async fn export_reimports_identically() {
    let clinic = TestClinic::new();
    let ledger = LedgerService::new(&clinic.config);

    let records = vec![record("Jane Doe", 1, 10), record("John Roe", 2, 9)];
    for r in &records {
        ledger.append(r).await.unwrap();
    }

    let exported = ledger.export_csv().unwrap();
    let text = String::from_utf8(exported.clone()).unwrap();
    assert!(text.starts_with(
        "Patient Name,DOB,Patient Type,Doctor,Location,Date,Time,Duration (min),Email,Phone,Insurance Carrier,Member ID,Group Number\n"
    ));
    assert!(text.contains("\"G-7, east wing\""));

    assert_eq!(ledger.import_csv(&exported).unwrap(), records);
    assert_eq!(ledger.export_csv().unwrap(), exported);
}

#[test]
fn export_of_empty_ledger_is_header_only() {
    let clinic = TestClinic::new();
    let ledger = LedgerService::new(&clinic.config);

    let exported = String::from_utf8(ledger.export_csv().unwrap()).unwrap();
    assert_eq!(exported.lines().count(), 1);
    assert!(exported.starts_with("Patient Name,"));
}

#[test]
fn reconcile_reports_orphans_and_duplicates() {
    let booked = ScheduleSlot {
        doctor: "Dr. Smith".to_string(),
        date: date(2024, 5, 1),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        status: SlotStatus::Booked,
    };
    let open = ScheduleSlot {
        time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        status: SlotStatus::Available,
        ..booked.clone()
    };
    let orphan_booking = ScheduleSlot {
        date: date(2024, 5, 2),
        ..booked.clone()
    };

    let records = vec![
        record("Jane Doe", 1, 10),
        record("John Roe", 1, 10),
        record("Walk In", 1, 9),
    ];
    let report = reconcile(&[booked.clone(), open, orphan_booking.clone()], &records);

    assert!(!report.is_consistent);
    assert_eq!(report.booked_without_record, vec![orphan_booking.key()]);
    assert_eq!(report.records_without_booking.len(), 1);
    assert_eq!(report.records_without_booking[0].patient_name, "Walk In");
    assert_eq!(report.duplicate_records, vec![booked.key()]);
}

#[test]
fn reconcile_of_matching_tables_is_consistent() {
    let booked = ScheduleSlot {
        doctor: "Dr. Smith".to_string(),
        date: date(2024, 5, 1),
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        status: SlotStatus::Booked,
    };

    let report = reconcile(&[booked], &[record("Jane Doe", 1, 10)]);
    assert!(report.is_consistent);
}
