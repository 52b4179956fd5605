use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::clients::RemoteClient;
use crate::models::maintenance::MaintenanceRecord;
use crate::models::truck::Truck;
use crate::repositories::{MaintenanceRepository, TruckRepository};
use crate::utils::errors::AppError;

/// Días sin servicio a partir de los cuales un camión necesita mantenimiento
pub const SERVICE_STALE_DAYS: i64 = 30;
/// Ciclo de mantenimiento asumido
pub const SERVICE_CYCLE_DAYS: i64 = 90;
/// Ventana de "próximos" mantenimientos
pub const UPCOMING_WINDOW_DAYS: i64 = 30;
pub const DASHBOARD_LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RecentMaintenance {
    pub record: MaintenanceRecord,
    pub truck_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingMaintenance {
    pub truck_id: Uuid,
    pub truck_label: String,
    pub due_date: DateTime<Utc>,
    pub days_until: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_trucks: usize,
    pub trucks_needing_maintenance: usize,
    pub recent_maintenance: Vec<RecentMaintenance>,
    pub upcoming_maintenance: Vec<UpcomingMaintenance>,
}

/// Días enteros hasta `due`, redondeando hacia arriba
fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (due - now).num_seconds();
    let day = 86_400;
    if seconds > 0 {
        (seconds + day - 1) / day
    } else {
        seconds / day
    }
}

/// Resumen del panel a partir de los camiones y los registros
/// (estos ordenados por `performed_at` descendente)
pub fn summarize(trucks: &[Truck], records: &[MaintenanceRecord], now: DateTime<Utc>) -> DashboardSummary {
    let mut latest: HashMap<Uuid, &MaintenanceRecord> = HashMap::new();
    for record in records {
        latest
            .entry(record.truck_id)
            .and_modify(|current| {
                if record.performed_at > current.performed_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let stale_before = now - Duration::days(SERVICE_STALE_DAYS);
    let trucks_needing_maintenance = trucks
        .iter()
        .filter(|truck| match latest.get(&truck.id) {
            None => true,
            Some(last) => last.performed_at < stale_before || last.is_overdue(truck.current_mileage),
        })
        .count();

    let labels: HashMap<Uuid, String> = trucks.iter().map(|t| (t.id, t.label())).collect();
    let recent_maintenance = records
        .iter()
        .take(DASHBOARD_LIST_LIMIT)
        .map(|record| RecentMaintenance {
            record: record.clone(),
            truck_label: labels
                .get(&record.truck_id)
                .cloned()
                .unwrap_or_else(|| "Unknown truck".to_string()),
        })
        .collect();

    let mut upcoming_maintenance: Vec<UpcomingMaintenance> = trucks
        .iter()
        .filter_map(|truck| {
            let last = latest.get(&truck.id)?;
            let due_date = last.performed_at + Duration::days(SERVICE_CYCLE_DAYS);
            let days = days_until(due_date, now);
            (days > 0 && days <= UPCOMING_WINDOW_DAYS).then(|| UpcomingMaintenance {
                truck_id: truck.id,
                truck_label: truck.label(),
                due_date,
                days_until: days,
            })
        })
        .collect();
    upcoming_maintenance.sort_by_key(|u| u.days_until);
    upcoming_maintenance.truncate(DASHBOARD_LIST_LIMIT);

    DashboardSummary {
        total_trucks: trucks.len(),
        trucks_needing_maintenance,
        recent_maintenance,
        upcoming_maintenance,
    }
}

pub struct DashboardController {
    trucks: TruckRepository,
    records: MaintenanceRepository,
}

impl DashboardController {
    pub fn new(client: Arc<dyn RemoteClient>) -> Self {
        Self {
            trucks: TruckRepository::new(Arc::clone(&client)),
            records: MaintenanceRepository::new(client),
        }
    }

    pub async fn summary(&self, company_id: Uuid) -> Result<DashboardSummary, AppError> {
        let trucks = self.trucks.list_by_company(company_id).await?;
        let records = self.records.list_by_company(company_id).await?;
        Ok(summarize(&trucks, &records, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truck(make: &str, mileage: i64) -> Truck {
        Truck {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            vin: "1FUJGLDR5CSBM1234".to_string(),
            license_plate: "ABC-1234".to_string(),
            year: 2019,
            make: make.to_string(),
            model: "Cascadia".to_string(),
            current_mileage: mileage,
            notes: None,
            created_at: None,
        }
    }

    fn record(truck: &Truck, performed_at: DateTime<Utc>, next_due: Option<i64>) -> MaintenanceRecord {
        MaintenanceRecord {
            id: Uuid::new_v4(),
            company_id: truck.company_id,
            truck_id: truck.id,
            maintenance_type: "Oil Change".to_string(),
            performed_at,
            mileage: truck.current_mileage,
            next_due_mileage: next_due,
            part_make_model: None,
            notes: None,
            created_at: None,
        }
    }

    #[test]
    fn test_needing_maintenance_rules() {
        let now = Utc::now();
        let never = truck("Never", 100);
        let stale = truck("Stale", 100);
        let fresh = truck("Fresh", 100);
        let overdue = truck("Overdue", 5_000);

        let mut records = vec![
            record(&fresh, now - Duration::days(5), None),
            record(&overdue, now - Duration::days(2), Some(4_000)),
            record(&stale, now - Duration::days(45), None),
        ];
        records.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));

        let summary = summarize(&[never, stale, fresh, overdue], &records, now);
        assert_eq!(summary.total_trucks, 4);
        assert_eq!(summary.trucks_needing_maintenance, 3);
        assert_eq!(summary.recent_maintenance.len(), 3);
        assert_eq!(summary.recent_maintenance[0].truck_label, "Overdue Cascadia (2019)");
    }

    #[test]
    fn test_upcoming_window_and_order() {
        let now = Utc::now();
        // Due in 10 and 20 days; one due in 60 days; one already past due
        let soon = truck("Soon", 0);
        let later = truck("Later", 0);
        let far = truck("Far", 0);
        let past = truck("Past", 0);
        let records = vec![
            record(&soon, now - Duration::days(80), None),
            record(&later, now - Duration::days(70), None),
            record(&far, now - Duration::days(30), None),
            record(&past, now - Duration::days(100), None),
        ];

        let summary = summarize(&[far, later.clone(), soon.clone(), past], &records, now);
        let ids: Vec<Uuid> = summary.upcoming_maintenance.iter().map(|u| u.truck_id).collect();
        assert_eq!(ids, vec![soon.id, later.id]);
        assert_eq!(summary.upcoming_maintenance[0].days_until, 10);
    }

    #[test]
    fn test_lists_are_capped() {
        let now = Utc::now();
        let trucks: Vec<Truck> = (0..8).map(|i| truck(&format!("T{}", i), 0)).collect();
        let records: Vec<MaintenanceRecord> = trucks
            .iter()
            .enumerate()
            .map(|(i, t)| record(t, now - Duration::days(70 + i as i64), None))
            .collect();

        let summary = summarize(&trucks, &records, now);
        assert_eq!(summary.recent_maintenance.len(), DASHBOARD_LIST_LIMIT);
        assert_eq!(summary.upcoming_maintenance.len(), DASHBOARD_LIST_LIMIT);
    }

    #[test]
    fn test_empty_fleet() {
        assert_eq!(summarize(&[], &[], Utc::now()), DashboardSummary::default());
    }
}
