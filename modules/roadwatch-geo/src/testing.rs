// Test doubles for division resolution.
//
// CountingDivisionSource: in-memory DivisionSource with call counters so
// tests can assert on cache behaviour without a database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use roadwatch_common::{Division, Officer};

use crate::index::DivisionSource;

/// Pune, Pimpri-Chinchwad area.
pub const PCMC: (f64, f64) = (18.62, 73.80);
/// Mumbai, well outside any PCMC test division.
pub const MUMBAI: (f64, f64) = (19.076, 72.8777);

pub struct CountingDivisionSource {
    divisions: Vec<Division>,
    list_calls: AtomicUsize,
    by_id_calls: AtomicUsize,
    failing: AtomicBool,
}

impl CountingDivisionSource {
    pub fn new(divisions: Vec<Division>) -> Self {
        Self {
            divisions,
            list_calls: AtomicUsize::new(0),
            by_id_calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every call return an error until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn by_id_calls(&self) -> usize {
        self.by_id_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DivisionSource for CountingDivisionSource {
    async fn list_divisions(&self) -> Result<Vec<Division>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("division store unavailable");
        }
        Ok(self.divisions.clone())
    }

    async fn division_by_id(&self, id: Uuid) -> Result<Option<Division>> {
        self.by_id_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("division store unavailable");
        }
        Ok(self.divisions.iter().find(|d| d.id == id).cloned())
    }
}

/// Axis-aligned square division centred on (lat, lng) with no officers.
pub fn square_division(name: &str, lat: f64, lng: f64, half_size: f64) -> Division {
    Division {
        id: Uuid::new_v4(),
        name: name.to_string(),
        code: name.to_uppercase(),
        email: None,
        boundary: vec![
            [lng - half_size, lat - half_size],
            [lng + half_size, lat - half_size],
            [lng + half_size, lat + half_size],
            [lng - half_size, lat + half_size],
            [lng - half_size, lat - half_size],
        ],
        officers: Vec::new(),
    }
}

pub fn officer(name: &str, phone: &str, alternate: Option<&str>, is_active: bool) -> Officer {
    Officer {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: phone.to_string(),
        alternate_phone: alternate.map(|s| s.to_string()),
        is_active,
    }
}
