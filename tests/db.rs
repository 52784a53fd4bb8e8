use pushkind_crm::domain::order::OrderListQuery;
use pushkind_crm::repository::{DieselRepository, OrderReader};

mod common;

#[test]
fn test_creates_and_removes_db_files() {
    let base = "test_crm_db_lifecycle.db";

    {
        let test_db = common::TestDb::new(base);
        let conn = test_db.pool().get();
        assert!(conn.is_ok());

        let repo = DieselRepository::new(test_db.pool());
        let (total, orders) = repo.list_orders(OrderListQuery::new(1)).unwrap();
        assert_eq!(total, 0);
        assert!(orders.is_empty());
    }

    let db_path = std::path::Path::new(base);
    assert!(!db_path.exists());
    assert!(!std::path::Path::new(&format!("{base}-shm")).exists());
    assert!(!std::path::Path::new(&format!("{base}-wal")).exists());
}
