//! Stock inventory on the Node backend: category tree and inventory items.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{args, DsmsApi};
use crate::endpoint::{EndpointDef, Verb};
use crate::tags::{TagSpec, TagType};
use crate::transport::ApiError;

pub static MAIN_CATEGORIES: EndpointDef = EndpointDef::node_query(
  "getMainCategories",
  Verb::Get,
  "/stock/main-categories",
  &[TagSpec::Bare(TagType::MainCategories)],
);

pub static SUB_CATEGORIES: EndpointDef = EndpointDef::node_query(
  "getSubCategories",
  Verb::Get,
  "/stock/sub-categories",
  &[TagSpec::Bare(TagType::SubCategories)],
);

pub static INVENTORY_ITEMS: EndpointDef = EndpointDef::node_query(
  "getInventoryItems",
  Verb::Get,
  "/stock/items",
  &[TagSpec::Bare(TagType::InventoryItems)],
);

pub static CREATE_STOCK_ASSET: EndpointDef = EndpointDef::node_mutation(
  "createStockAsset",
  "/stock/items",
  &[
    TagSpec::Bare(TagType::InventoryItems),
    TagSpec::Bare(TagType::Assets),
  ],
);

pub static ISSUE_STOCK: EndpointDef = EndpointDef::node_mutation(
  "issueStock",
  "/stock/issue",
  &[TagSpec::Bare(TagType::InventoryItems)],
);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainCategory {
  pub id: i64,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
  pub id: i64,
  pub name: String,
  pub main_category_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
  pub id: i64,
  pub name: String,
  pub sub_category_id: i64,
  pub quantity: f64,
  #[serde(default)]
  pub unit: Option<String>,
  #[serde(default)]
  pub supplier_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StockAssetDraft {
  pub name: String,
  pub sub_category_id: i64,
  pub quantity: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub unit: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub supplier_id: Option<i64>,
}

impl DsmsApi {
  pub async fn main_categories(&self) -> Result<Vec<MainCategory>, ApiError> {
    self.fetch(MAIN_CATEGORIES.request(json!({}))).await
  }

  pub async fn sub_categories(&self, main_category_id: i64) -> Result<Vec<SubCategory>, ApiError> {
    self
      .fetch(SUB_CATEGORIES.request(json!({ "main_category_id": main_category_id })))
      .await
  }

  pub async fn inventory_items(&self, sub_category_id: Option<i64>) -> Result<Vec<InventoryItem>, ApiError> {
    let query = match sub_category_id {
      Some(id) => json!({ "sub_category_id": id }),
      None => json!({}),
    };
    self.fetch(INVENTORY_ITEMS.request(query)).await
  }

  pub async fn create_stock_asset(&self, draft: &StockAssetDraft) -> Result<InventoryItem, ApiError> {
    self.mutate(CREATE_STOCK_ASSET.request(args(draft)?)).await
  }

  pub async fn issue_stock(&self, item_id: i64, quantity: f64, team_id: i64) -> Result<(), ApiError> {
    let request = ISSUE_STOCK.request(json!({
      "item_id": item_id,
      "quantity": quantity,
      "team_id": team_id,
    }));
    let _: serde_json::Value = self.mutate(request).await?;
    Ok(())
  }
}
