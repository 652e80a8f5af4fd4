use crate::core::Storage;
use crate::utils::error::{FigureError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// In-memory storage shared between a pipeline and the test that inspects it.
#[derive(Clone, Default)]
pub struct MockStorage {
    files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.borrow().get(path).cloned()
    }

    pub fn get_text(&self, path: &str) -> Option<String> {
        self.get_file(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.borrow().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl Storage for MockStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.get_file(path).ok_or_else(|| FigureError::FileNotFound {
            path: path.to_string(),
        })
    }

    fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn display_path(&self, path: &str) -> String {
        path.to_string()
    }
}

pub const REPORT_HEADER: &str = "Name of Covered Entity,State,Covered Entity Type,Individuals Affected,Breach Submission Date,Type of Breach,Location of Breached Information";

/// Small breach report spanning 2023-01 to 2024-02.
pub fn sample_report() -> String {
    let rows = [
        "North Clinic,CT,Healthcare Provider,1500,01/10/2023,Hacking/IT Incident,Network Server",
        "South Hospital,NY,Healthcare Provider,2500000,02/14/2023,Hacking/IT Incident,Email",
        "East Health,MA,Healthcare Provider,800,03/03/2023,Hacking/IT Incident,Electronic Medical Record",
        "West Medical,CA,Healthcare Provider,12000,03/20/2023,Theft,Paper/Films",
        "Care Plan,TX,Health Plan,40000,04/11/2023,Hacking/IT Incident,Network Server",
        "Lake Clinic,OH,Healthcare Provider,300,06/30/2023,Hacking/IT Incident,\"Email, Network Server\"",
        "River Hospital,WA,Healthcare Provider,95000,09/05/2023,Unauthorized Access/Disclosure,Email",
        "Hill Practice,CO,Healthcare Provider,4100,11/22/2023,Hacking/IT Incident,Desktop Computer",
        "Bay Medical,FL,Healthcare Provider,700,,Hacking/IT Incident,Network Server",
        "Summit Health,UT,Healthcare Provider,65000,02/02/2024,Hacking/IT Incident,Network Server",
    ];
    format!("{}\n{}\n", REPORT_HEADER, rows.join("\n"))
}
