// In-memory adapters for the repository ports
// Stand-ins for the transactional row store; the engine only ever sees the
// port traits, so swapping in a database-backed adapter is a wiring change.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use backend_domain::ports::{AlertRepository, DonorRegistry};
use backend_domain::{Alert, AlertId, BloodType, Donor, DonorId, GeoPoint};

#[derive(Default)]
pub struct InMemoryDonorRegistry {
    donors: RwLock<HashMap<DonorId, Donor>>,
}

impl InMemoryDonorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_donors(donors: Vec<Donor>) -> Self {
        Self {
            donors: RwLock::new(donors.into_iter().map(|d| (d.id, d)).collect()),
        }
    }
}

#[async_trait]
impl DonorRegistry for InMemoryDonorRegistry {
    async fn eligible_donors(
        &self,
        blood_type: BloodType,
        center: GeoPoint,
        radius_km: f64,
    ) -> anyhow::Result<Vec<Donor>> {
        // Coarse pre-filter: compatible type inside the radius. The matcher
        // re-derives eligibility and scores the survivors.
        let donors = self.donors.read().await;
        Ok(donors
            .values()
            .filter(|donor| donor.blood_type.compatibility_tier(blood_type).is_some())
            .filter(|donor| center.haversine_km(&donor.location) <= radius_km)
            .cloned()
            .collect())
    }

    async fn get_donor(&self, id: DonorId) -> anyhow::Result<Option<Donor>> {
        Ok(self.donors.read().await.get(&id).cloned())
    }

    async fn upsert_donor(&self, donor: Donor) -> anyhow::Result<()> {
        self.donors.write().await.insert(donor.id, donor);
        Ok(())
    }

    async fn apply_reliability_delta(&self, id: DonorId, delta: i16) -> anyhow::Result<()> {
        let mut donors = self.donors.write().await;
        let donor = donors
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("unknown donor {}", id))?;
        donor.reliability_score = (donor.reliability_score as i16 + delta).clamp(0, 100) as u8;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<HashMap<AlertId, Alert>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AlertRepository for InMemoryAlertRepository {
    async fn insert(&self, alert: Alert) -> anyhow::Result<()> {
        self.alerts.write().await.insert(alert.id, alert);
        Ok(())
    }

    async fn get(&self, id: AlertId) -> anyhow::Result<Option<Alert>> {
        Ok(self.alerts.read().await.get(&id).cloned())
    }

    async fn update(&self, alert: Alert) -> anyhow::Result<()> {
        let mut alerts = self.alerts.write().await;
        if !alerts.contains_key(&alert.id) {
            anyhow::bail!("unknown alert {}", alert.id);
        }
        alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn list_active(&self) -> anyhow::Result<Vec<Alert>> {
        Ok(self
            .alerts
            .read()
            .await
            .values()
            .filter(|alert| alert.is_active())
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> anyhow::Result<Vec<Alert>> {
        Ok(self.alerts.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, Utc};

    use super::*;

    fn donor(blood_type: BloodType, km_north: f64) -> Donor {
        Donor {
            id: DonorId::generate(),
            name: "Registry Donor".to_string(),
            blood_type,
            location: GeoPoint::new(28.6139 + km_north / 111.2, 77.2090),
            last_donation_date: Utc::now() - Duration::days(120),
            reliability_score: 80,
            health_flags: BTreeSet::new(),
            channels: BTreeSet::new(),
            on_call_now: true,
            total_donations: 3,
        }
    }

    #[tokio::test]
    async fn eligible_donors_filters_type_and_radius() {
        let registry = InMemoryDonorRegistry::with_donors(vec![
            donor(BloodType::ONeg, 1.0),
            donor(BloodType::APos, 1.0),
            donor(BloodType::ONeg, 50.0),
        ]);
        let pool = registry
            .eligible_donors(BloodType::ONeg, GeoPoint::new(28.6139, 77.2090), 5.0)
            .await
            .expect("pool");
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].blood_type, BloodType::ONeg);
    }

    #[tokio::test]
    async fn reliability_delta_clamps_at_the_bounds() {
        let d = donor(BloodType::ONeg, 1.0);
        let id = d.id;
        let registry = InMemoryDonorRegistry::with_donors(vec![d]);

        registry
            .apply_reliability_delta(id, 100)
            .await
            .expect("raise");
        assert_eq!(
            registry.get_donor(id).await.expect("get").expect("donor").reliability_score,
            100
        );
        registry
            .apply_reliability_delta(id, -200)
            .await
            .expect("lower");
        assert_eq!(
            registry.get_donor(id).await.expect("get").expect("donor").reliability_score,
            0
        );
    }

    #[tokio::test]
    async fn update_requires_an_existing_alert() {
        use backend_domain::Urgency;
        let repo = InMemoryAlertRepository::new();
        let alert = Alert::new(
            AlertId::generate(),
            BloodType::ONeg,
            5,
            Urgency::Critical,
            GeoPoint::new(0.0, 0.0),
            5.0,
            Utc::now(),
        );
        assert!(repo.update(alert.clone()).await.is_err());
        repo.insert(alert.clone()).await.expect("insert");
        repo.update(alert).await.expect("update");
    }
}
