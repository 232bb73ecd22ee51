use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_service_processes_table::Migration),
            Box::new(m20240301_000002_create_stage_activities_table::Migration),
            Box::new(m20240301_000003_create_stage_routing_tables::Migration),
            Box::new(m20240301_000004_create_raw_materials_tables::Migration),
            Box::new(m20240301_000005_create_item_requests_tables::Migration),
            Box::new(m20240301_000006_create_disassemble_recovery_tables::Migration),
            Box::new(m20240301_000007_create_warehouse_stocks_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_service_processes_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_service_processes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServiceProcesses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceProcesses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceProcesses::Product).string().not_null())
                        .col(ColumnDef::new(ServiceProcesses::Item).string().not_null())
                        .col(ColumnDef::new(ServiceProcesses::SubItem).string().not_null())
                        .col(
                            ColumnDef::new(ServiceProcesses::SerialNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::ItemType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::CurrentStage)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::InitialStage)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::RestartedFromStage)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::FinalStatus)
                                .string_len(16)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::IsClosed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ServiceProcesses::IsRepaired).boolean().null())
                        .col(
                            ColumnDef::new(ServiceProcesses::IsDisassemblePending)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::DisassembleSessionId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::DisassembleStatus)
                                .string_len(16)
                                .null(),
                        )
                        .col(ColumnDef::new(ServiceProcesses::CreatedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(ServiceProcesses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceProcesses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Unit identity lookup used by the same-day duplicate guard
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_processes_unit_identity")
                        .table(ServiceProcesses::Table)
                        .col(ServiceProcesses::Product)
                        .col(ServiceProcesses::Item)
                        .col(ServiceProcesses::SubItem)
                        .col(ServiceProcesses::SerialNumber)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_processes_status")
                        .table(ServiceProcesses::Table)
                        .col(ServiceProcesses::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceProcesses::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum ServiceProcesses {
        Table,
        Id,
        Product,
        Item,
        SubItem,
        SerialNumber,
        Quantity,
        ItemType,
        CurrentStage,
        InitialStage,
        RestartedFromStage,
        Status,
        FinalStatus,
        IsClosed,
        IsRepaired,
        IsDisassemblePending,
        DisassembleSessionId,
        DisassembleStatus,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_stage_activities_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stage_activities_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StageActivities::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StageActivities::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StageActivities::ServiceProcessId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StageActivities::Stage).string().not_null())
                        .col(
                            ColumnDef::new(StageActivities::Status)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StageActivities::EmployeeId).uuid().null())
                        .col(
                            ColumnDef::new(StageActivities::IsCurrent)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StageActivities::FailureReason).string().null())
                        .col(ColumnDef::new(StageActivities::Remarks).string().null())
                        .col(
                            ColumnDef::new(StageActivities::AcceptedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StageActivities::StartedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StageActivities::CompletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StageActivities::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StageActivities::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stage_activities_service_process")
                                .from(StageActivities::Table, StageActivities::ServiceProcessId)
                                .to(
                                    super::m20240301_000001_create_service_processes_table::ServiceProcesses::Table,
                                    super::m20240301_000001_create_service_processes_table::ServiceProcesses::Id,
                                ),
                        )
                        .to_owned(),
                )
                .await?;

            // Current-activity lookup: one per process while open
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stage_activities_process_current")
                        .table(StageActivities::Table)
                        .col(StageActivities::ServiceProcessId)
                        .col(StageActivities::IsCurrent)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stage_activities_employee")
                        .table(StageActivities::Table)
                        .col(StageActivities::EmployeeId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StageActivities::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StageActivities {
        Table,
        Id,
        ServiceProcessId,
        Stage,
        Status,
        EmployeeId,
        IsCurrent,
        FailureReason,
        Remarks,
        AcceptedAt,
        StartedAt,
        CompletedAt,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000003_create_stage_routing_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stage_routing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StageFlows::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(StageFlows::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(StageFlows::Product).string().not_null())
                        .col(ColumnDef::new(StageFlows::ItemType).string_len(16).not_null())
                        .col(ColumnDef::new(StageFlows::CurrentStage).string().not_null())
                        .col(ColumnDef::new(StageFlows::NextStage).string().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stage_flows_lookup")
                        .table(StageFlows::Table)
                        .col(StageFlows::Product)
                        .col(StageFlows::ItemType)
                        .col(StageFlows::CurrentStage)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(FailureRedirects::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(FailureRedirects::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(FailureRedirects::Product).string().not_null())
                        .col(
                            ColumnDef::new(FailureRedirects::ItemType)
                                .string_len(16)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FailureRedirects::FailureReason)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(FailureRedirects::RedirectStage)
                                .string()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_failure_redirects_lookup")
                        .table(FailureRedirects::Table)
                        .col(FailureRedirects::Product)
                        .col(FailureRedirects::ItemType)
                        .col(FailureRedirects::FailureReason)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(FailureRedirects::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StageFlows::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum StageFlows {
        Table,
        Id,
        Product,
        ItemType,
        CurrentStage,
        NextStage,
    }

    #[derive(Iden)]
    pub enum FailureRedirects {
        Table,
        Id,
        Product,
        ItemType,
        FailureReason,
        RedirectStage,
    }
}

mod m20240301_000004_create_raw_materials_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_raw_materials_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RawMaterials::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(RawMaterials::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(RawMaterials::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(RawMaterials::Stock)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(RawMaterials::Unit).string().not_null())
                        .col(
                            ColumnDef::new(RawMaterials::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RawMaterials::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UserItemStocks::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(UserItemStocks::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(UserItemStocks::RawMaterialId).uuid().not_null())
                        .col(
                            ColumnDef::new(UserItemStocks::Quantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(UserItemStocks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(UserItemStocks::EmployeeId)
                                .col(UserItemStocks::RawMaterialId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_user_item_stocks_raw_material")
                                .from(UserItemStocks::Table, UserItemStocks::RawMaterialId)
                                .to(RawMaterials::Table, RawMaterials::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemUsages::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ItemUsages::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ItemUsages::ServiceProcessId).uuid().not_null())
                        .col(ColumnDef::new(ItemUsages::EmployeeId).uuid().not_null())
                        .col(ColumnDef::new(ItemUsages::RawMaterialId).uuid().not_null())
                        .col(
                            ColumnDef::new(ItemUsages::QuantityUsed)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemUsages::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_usages_raw_material")
                                .from(ItemUsages::Table, ItemUsages::RawMaterialId)
                                .to(RawMaterials::Table, RawMaterials::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_usages_process")
                        .table(ItemUsages::Table)
                        .col(ItemUsages::ServiceProcessId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemUsages::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UserItemStocks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RawMaterials::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum RawMaterials {
        Table,
        Id,
        Name,
        Stock,
        Unit,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum UserItemStocks {
        Table,
        EmployeeId,
        RawMaterialId,
        Quantity,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum ItemUsages {
        Table,
        Id,
        ServiceProcessId,
        EmployeeId,
        RawMaterialId,
        QuantityUsed,
        CreatedAt,
    }
}

mod m20240301_000005_create_item_requests_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_item_requests_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ItemRequests::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(ItemRequests::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(ItemRequests::RequestedBy).uuid().not_null())
                        .col(ColumnDef::new(ItemRequests::RequestedTo).uuid().not_null())
                        .col(
                            ColumnDef::new(ItemRequests::IsProcessRequest)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ItemRequests::ServiceProcessId).uuid().null())
                        .col(ColumnDef::new(ItemRequests::Approved).boolean().null())
                        .col(ColumnDef::new(ItemRequests::Declined).boolean().null())
                        .col(
                            ColumnDef::new(ItemRequests::MaterialGiven)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(ItemRequests::Remarks).string().null())
                        .col(ColumnDef::new(ItemRequests::ProcessedBy).uuid().null())
                        .col(
                            ColumnDef::new(ItemRequests::ProcessedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_item_requests_requested_to")
                        .table(ItemRequests::Table)
                        .col(ItemRequests::RequestedTo)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ItemRequestLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ItemRequestLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::ItemRequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::RawMaterialId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ItemRequestLines::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ItemRequestLines::Unit).string().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_item_request_lines_request")
                                .from(ItemRequestLines::Table, ItemRequestLines::ItemRequestId)
                                .to(ItemRequests::Table, ItemRequests::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ItemRequestLines::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ItemRequests::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum ItemRequests {
        Table,
        Id,
        RequestedBy,
        RequestedTo,
        IsProcessRequest,
        ServiceProcessId,
        Approved,
        Declined,
        MaterialGiven,
        Remarks,
        ProcessedBy,
        ProcessedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum ItemRequestLines {
        Table,
        Id,
        ItemRequestId,
        RawMaterialId,
        Quantity,
        Unit,
    }
}

mod m20240301_000006_create_disassemble_recovery_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_disassemble_recovery_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DisassembleRecoveries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DisassembleRecoveries::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveries::ServiceProcessId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveries::DisassembledBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveries::ReceivedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DisassembleRecoveries::Remarks).string().null())
                        .col(
                            ColumnDef::new(DisassembleRecoveries::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DisassembleRecoveryLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DisassembleRecoveryLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveryLines::DisassembleRecoveryId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveryLines::RawMaterialId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveryLines::Quantity)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DisassembleRecoveryLines::Unit)
                                .string()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_disassemble_recovery_lines_recovery")
                                .from(
                                    DisassembleRecoveryLines::Table,
                                    DisassembleRecoveryLines::DisassembleRecoveryId,
                                )
                                .to(DisassembleRecoveries::Table, DisassembleRecoveries::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(DisassembleRecoveryLines::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(DisassembleRecoveries::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum DisassembleRecoveries {
        Table,
        Id,
        ServiceProcessId,
        DisassembledBy,
        ReceivedBy,
        Remarks,
        CreatedAt,
    }

    #[derive(Iden)]
    pub enum DisassembleRecoveryLines {
        Table,
        Id,
        DisassembleRecoveryId,
        RawMaterialId,
        Quantity,
        Unit,
    }
}

mod m20240301_000007_create_warehouse_stocks_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000007_create_warehouse_stocks_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WarehouseStocks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WarehouseStocks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WarehouseStocks::Warehouse).string().not_null())
                        .col(ColumnDef::new(WarehouseStocks::SubItem).string().not_null())
                        .col(
                            ColumnDef::new(WarehouseStocks::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseStocks::NewStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(WarehouseStocks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warehouse_stocks_sub_item")
                        .table(WarehouseStocks::Table)
                        .col(WarehouseStocks::SubItem)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WarehouseStocks::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum WarehouseStocks {
        Table,
        Id,
        Warehouse,
        SubItem,
        Quantity,
        NewStock,
        UpdatedAt,
    }
}
