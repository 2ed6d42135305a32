//! In-memory directory for demos and tests.

use async_trait::async_trait;

use crate::directory::model::{College, Professional, sort_by_rating_desc};
use crate::directory::provider::ProfessionalDirectory;
use crate::error::DirectoryError;

/// A fixed roster held in memory.
pub struct MemoryDirectory {
    colleges: Vec<College>,
    professionals: Vec<Professional>,
}

impl MemoryDirectory {
    pub fn new(colleges: Vec<College>, professionals: Vec<Professional>) -> Self {
        Self {
            colleges,
            professionals,
        }
    }

    /// A small plausible roster for the console driver and examples.
    pub fn with_sample_data() -> Self {
        let colleges = vec![
            college("clg-1", "RKGIT"),
            college("clg-2", "ABES Engineering College"),
            college("clg-3", "KIET Group of Institutions"),
            college("clg-4", "IMS Ghaziabad"),
        ];

        let professionals = vec![
            counsellor("cns-1", "Priya Sharma", "RKGIT", 4.6, 38),
            counsellor("cns-2", "Arjun Mehta", "RKGIT", 4.2, 21),
            counsellor("cns-3", "Sneha Gupta", "ABES Engineering College", 4.8, 54),
            counsellor("cns-4", "Rahul Verma", "KIET Group of Institutions", 3.9, 12),
            counsellor("cns-5", "Anita Joshi", "IMS Ghaziabad", 4.4, 29),
            doctor("doc-1", "Dr. Kavita Rao", "Psychiatry", 4.9, 112),
            doctor("doc-2", "Dr. Sanjay Kulkarni", "Clinical Psychology", 4.5, 67),
            doctor("doc-3", "Dr. Meera Nair", "Adolescent Psychiatry", 4.7, 80),
        ];

        Self::new(colleges, professionals)
    }
}

#[async_trait]
impl ProfessionalDirectory for MemoryDirectory {
    async fn list_colleges(&self) -> Result<Vec<College>, DirectoryError> {
        Ok(self.colleges.clone())
    }

    async fn list_doctors(&self) -> Result<Vec<Professional>, DirectoryError> {
        let mut doctors: Vec<Professional> = self
            .professionals
            .iter()
            .filter(|p| matches!(p, Professional::Doctor { .. }))
            .cloned()
            .collect();
        sort_by_rating_desc(&mut doctors);
        Ok(doctors)
    }

    async fn counsellors_by_college(
        &self,
        college: &str,
    ) -> Result<Vec<Professional>, DirectoryError> {
        let wanted = college.trim();
        let mut counsellors: Vec<Professional> = self
            .professionals
            .iter()
            .filter(|p| matches!(p, Professional::Counsellor { college, .. } if college == wanted))
            .cloned()
            .collect();
        sort_by_rating_desc(&mut counsellors);
        Ok(counsellors)
    }
}

fn college(id: &str, name: &str) -> College {
    College {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn counsellor(id: &str, name: &str, college: &str, rating: f32, review_count: u32) -> Professional {
    Professional::Counsellor {
        id: id.to_string(),
        name: name.to_string(),
        college: college.to_string(),
        rating,
        review_count,
    }
}

fn doctor(id: &str, name: &str, specialization: &str, rating: f32, review_count: u32) -> Professional {
    Professional::Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialization: specialization.to_string(),
        rating,
        review_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn doctors_are_sorted_by_rating() {
        let dir = MemoryDirectory::with_sample_data();
        let doctors = dir.list_doctors().await.unwrap();
        assert!(!doctors.is_empty());
        for pair in doctors.windows(2) {
            assert!(pair[0].rating() >= pair[1].rating());
        }
        assert!(
            doctors
                .iter()
                .all(|p| matches!(p, Professional::Doctor { .. }))
        );
    }

    #[tokio::test]
    async fn counsellors_filtered_to_college() {
        let dir = MemoryDirectory::with_sample_data();
        let counsellors = dir.counsellors_by_college("RKGIT").await.unwrap();
        assert_eq!(counsellors.len(), 2);
        assert!(counsellors.iter().all(|p| p.affiliation() == "RKGIT"));
        // Descending rating within the college
        assert!(counsellors[0].rating() >= counsellors[1].rating());
    }

    #[tokio::test]
    async fn unknown_college_yields_empty_list() {
        let dir = MemoryDirectory::with_sample_data();
        let counsellors = dir.counsellors_by_college("Nowhere U").await.unwrap();
        assert!(counsellors.is_empty());
    }
}
