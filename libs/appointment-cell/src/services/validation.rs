use chrono::{Datelike, NaiveDate};

use crate::models::{AppointmentError, InsuranceCarrier, PatientDetails, PatientForm};

/// Number of birth years offered, counting the current one; the oldest accepted year is
/// `today.year() - MAX_PATIENT_AGE_YEARS + 1`.
pub const MAX_PATIENT_AGE_YEARS: i32 = 120;

/// Check a submitted form and turn it into trusted patient details.
/// `today` anchors the date-of-birth range.
pub fn validate_form(form: &PatientForm, today: NaiveDate) -> Result<PatientDetails, AppointmentError> {
    let name = required(&form.name, "Patient name")?;
    let location = required(&form.location, "Location")?;
    let doctor = required(&form.doctor, "Doctor")?;
    let date_of_birth = date_of_birth(form, today)?;

    let insurance_carrier = match non_blank(&form.insurance_carrier) {
        Some(carrier) => Some(
            carrier
                .parse::<InsuranceCarrier>()
                .map_err(AppointmentError::ValidationError)?,
        ),
        None => None,
    };

    Ok(PatientDetails {
        name,
        date_of_birth,
        doctor,
        location,
        email: non_blank(&form.email),
        phone: non_blank(&form.phone),
        insurance_carrier,
        member_id: non_blank(&form.member_id),
        group_number: non_blank(&form.group_number),
    })
}

fn required(value: &str, field: &str) -> Result<String, AppointmentError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppointmentError::ValidationError(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn date_of_birth(form: &PatientForm, today: NaiveDate) -> Result<NaiveDate, AppointmentError> {
    let (Some(day), Some(month), Some(year)) = (form.dob_day, form.dob_month, form.dob_year) else {
        return Err(AppointmentError::ValidationError(
            "Date of birth (day, month and year) is required".to_string(),
        ));
    };

    let dob = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppointmentError::ValidationError(format!(
            "Invalid date of birth: {:04}-{:02}-{:02}",
            year, month, day
        ))
    })?;

    if dob > today {
        return Err(AppointmentError::ValidationError(
            "Date of birth cannot be in the future".to_string(),
        ));
    }
    if year <= today.year() - MAX_PATIENT_AGE_YEARS {
        return Err(AppointmentError::ValidationError(format!(
            "Year of birth must be {} or later",
            today.year() - MAX_PATIENT_AGE_YEARS + 1
        )));
    }

    Ok(dob)
}
