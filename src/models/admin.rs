//! Administrative statistics and user-management types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Role;

/// Cross-user aggregate statistics from `GET /admin/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_expenses: u64,
    #[serde(default)]
    pub category_totals: HashMap<String, f64>,
    #[serde(default)]
    pub monthly_trends: Vec<MonthlyTrend>,
}

/// Aggregate spend for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub total: f64,
}

/// One row of the administrative user list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl AdminUser {
    /// Whether the UI may offer deletion for this row. Administrator
    /// accounts are never deletable from the user list; callers must check
    /// this before invoking `AdminStore::delete_user`.
    pub fn deletable(&self) -> bool {
        !self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_parse_camel_case() {
        let json = r#"{
            "totalUsers": 12,
            "totalExpenses": 340,
            "categoryTotals": {"Food": 812.5, "Transit": 140.0},
            "monthlyTrends": [{"month": "2025-01", "total": 420.0}]
        }"#;
        let stats: AdminStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_users, 12);
        assert_eq!(stats.category_totals["Food"], 812.5);
        assert_eq!(stats.monthly_trends[0].month, "2025-01");
    }

    #[test]
    fn test_admin_rows_are_not_deletable() {
        let admin = AdminUser {
            id: "u1".into(),
            name: "Root".into(),
            email: "root@example.com".into(),
            role: Role::Admin,
        };
        let user = AdminUser {
            role: Role::User,
            ..admin.clone()
        };
        assert!(!admin.deletable());
        assert!(user.deletable());
    }
}
