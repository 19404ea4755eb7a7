use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "blocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub page_uuid: Uuid,
    pub parent_uuid: Option<Uuid>,
    pub order_index: i32,
    pub content: String,
    pub properties: String, // JSON-encoded property map
    pub marker: Option<String>,
    pub deadline: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::page::Entity",
        from = "Column::PageUuid",
        to = "super::page::Column::Uuid",
        on_delete = "Cascade"
    )]
    Page,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentUuid",
        to = "Column::Uuid",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_many = "super::block_property::Entity")]
    Properties,
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Page.def()
    }
}

impl Related<super::block_property::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Properties.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
