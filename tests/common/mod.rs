#![allow(dead_code)]

use pathology_figures::LocalStorage;
use std::fs;
use tempfile::TempDir;

pub const BREACH_REPORT: &str = "\
Name of Covered Entity,State,Covered Entity Type,Individuals Affected,Breach Submission Date,Type of Breach,Location of Breached Information
Harbor Clinic,ME,Healthcare Provider,2300,01/15/2024,Hacking/IT Incident,Network Server
Maple Hospital,VT,Healthcare Provider,1250000,02/03/2024,Hacking/IT Incident,Email
Cedar Health,NH,Healthcare Provider,640,02/20/2024,Hacking/IT Incident,Electronic Medical Record
Pine Plan,RI,Health Plan,88000,03/09/2024,Hacking/IT Incident,Network Server
Oak Medical,CT,Healthcare Provider,5100,04/18/2024,Theft,Laptop
Birch Clinic,MA,Healthcare Provider,930,2024-05-02,Hacking/IT Incident,\"Email, Network Server\"
Elm Practice,NY,Healthcare Provider,17000,07/30/2024 14:05,Hacking/IT Incident,Desktop Computer
Ash Hospital,NJ,Healthcare Provider,410,not reported,Hacking/IT Incident,Network Server
";

/// Temporary workspace with the breach report at `data/breach_report.csv`.
pub fn workspace() -> (TempDir, LocalStorage) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/breach_report.csv"), BREACH_REPORT).unwrap();
    let storage = LocalStorage::new(dir.path());
    (dir, storage)
}

pub fn read_text(dir: &TempDir, path: &str) -> String {
    fs::read_to_string(dir.path().join(path)).unwrap()
}
