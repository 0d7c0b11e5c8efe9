//! `dsx entities` and `dsx get` commands.

use anyhow::{Result, bail};
use clap::Args;
use dsx_client::EntityQuery;

use super::KeyArgs;
use crate::opts::{EmulatorOpts, connect};
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct EntitiesArgs {
    /// Entity kind
    pub kind: String,

    /// Namespace (default namespace when omitted)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Only entities in this database; pages by offset instead of cursor
    #[arg(long)]
    pub database: Option<String>,

    /// Page size
    #[arg(long, default_value_t = 50)]
    pub limit: u32,

    /// Page token from a previous `nextPageToken`
    #[arg(long)]
    pub page: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub key: KeyArgs,
}

pub async fn cmd_entities(opts: &EmulatorOpts, args: &EntitiesArgs) -> Result<()> {
    let session = connect(opts)?;
    let query = EntityQuery {
        kind: args.kind.clone(),
        namespace_id: args.namespace.clone(),
        limit: Some(args.limit),
        page_token: args.page.clone(),
        database_id: args.database.clone(),
    };
    let page = session
        .client
        .get_entities_by_kind(&session.project_id, &query)
        .await;

    let next_page_token = page.next_page_token();
    let mut value = serde_json::to_value(&page)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("nextPageToken".into(), next_page_token.into());
    }
    print_json(opts, &value)
}

pub async fn cmd_get(opts: &EmulatorOpts, args: &GetArgs) -> Result<()> {
    let session = connect(opts)?;
    let key = args.key.to_key(&session.project_id);
    match session.client.fetch_entity(&session.project_id, &key).await? {
        Some(entity) => print_json(opts, &entity),
        None => bail!(
            "no {} entity '{}' in project {}",
            args.key.kind,
            args.key.id_or_name,
            session.project_id
        ),
    }
}
