pub mod lookup;

pub use lookup::PatientLookupService;
