//! Ticket planning and the ticket outbox
//!
//! Errors are grouped per (center, component, manifest) into one ticket
//! each; every center gets a master ticket linking its manifest tickets,
//! and a separate ticket for duplicate biospecimen/participant records.

use crate::error::{ReleaseError, ReleaseResult};
use crate::promote::release_display_name;
use async_trait::async_trait;
use htan_common::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Longest description sent inline; longer tables go out as attachments
pub const MAX_DESCRIPTION_CHARS: usize = 32_000;

/// Columns identifying the group, dropped from the per-ticket table
const GROUP_COLUMNS: [&str; 5] = ["Manifest_Id", "Manifest_Version", "Id", "HTAN_Center", "Component"];

/// Opaque ticket identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub String);

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketAttachment {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRequest {
    pub title: String,
    pub description: String,
    pub attachment: Option<TicketAttachment>,
}

/// Issue tracker collaborator
#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn create(&self, request: &TicketRequest) -> ReleaseResult<TicketId>;

    /// Record `child` as split from `parent`
    async fn link(&self, parent: &TicketId, child: &TicketId) -> ReleaseResult<()>;
}

/// Manifest ticket with the center it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestTicket {
    pub center: String,
    pub request: TicketRequest,
}

/// Every ticket a release would file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPlan {
    pub release: String,
    pub manifest_tickets: Vec<ManifestTicket>,
    pub clin_bio_tickets: Vec<TicketRequest>,
}

impl TicketPlan {
    pub fn centers(&self) -> Vec<&str> {
        let mut centers: Vec<&str> = self.manifest_tickets.iter().map(|t| t.center.as_str()).collect();
        centers.dedup();
        centers
    }

    pub fn is_empty(&self) -> bool {
        self.manifest_tickets.is_empty() && self.clin_bio_tickets.is_empty()
    }
}

/// Ids of filed tickets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FiledTickets {
    pub manifest: Vec<TicketId>,
    pub master: Vec<TicketId>,
    pub clin_bio: Vec<TicketId>,
}

/// Render a table as pipe-delimited text (header row, then data rows)
pub fn pipe_table(table: &Table) -> String {
    let line = |cells: Vec<&str>| format!("| {} |", cells.join(" | "));
    let mut lines = vec![line(table.columns().iter().map(String::as_str).collect())];
    for row in table.rows() {
        lines.push(line(row.iter().map(|c| c.as_deref().unwrap_or_default()).collect()));
    }
    lines.join("\n")
}

/// Group the published error tables into tickets
pub fn plan_tickets(errors: &Table, clin_bio_errors: &Table, release_label: &str) -> ReleaseResult<TicketPlan> {
    let release = release_display_name(release_label);
    let mut plan = TicketPlan {
        release: release.clone(),
        ..Default::default()
    };

    let groups = group_rows(errors, &["HTAN_Center", "Component", "Manifest_Id"])?;
    for (key, group) in groups {
        let (center, component, manifest) = (&key[0], &key[1], &key[2]);
        let title = format!("[{} Errors] {} {} {}", release, center, component, manifest);
        let body = group.without_columns(&GROUP_COLUMNS);
        let table_text = pipe_table(&body);

        let request = if table_text.chars().count() > MAX_DESCRIPTION_CHARS {
            TicketRequest {
                title,
                description: format!("Errors pertaining to manifest {} attached as csv", manifest),
                attachment: Some(TicketAttachment {
                    file_name: format!(
                        "{}_{}_{}.csv",
                        release_label.replace('.', "_"),
                        center.replace(' ', ""),
                        manifest
                    ),
                    content: body.to_csv_string()?,
                }),
            }
        } else {
            TicketRequest {
                title,
                description: format!("Errors pertaining to manifest {} \n {}", manifest, table_text),
                attachment: None,
            }
        };
        plan.manifest_tickets.push(ManifestTicket {
            center: center.clone(),
            request,
        });
    }

    for (key, group) in group_rows(clin_bio_errors, &["HTAN_Center"])? {
        let center = &key[0];
        plan.clin_bio_tickets.push(TicketRequest {
            title: format!("[HTAN Biospecimen/Participant ID Validation] {}", center),
            description: format!(
                "The table below contains biospecimen and participant IDs that were identified in multiple rows within {}'s Biospecimen and/or Demographics manifests respectively \n {}",
                center,
                pipe_table(&group)
            ),
            attachment: None,
        });
    }

    info!(
        manifest_tickets = plan.manifest_tickets.len(),
        clin_bio_tickets = plan.clin_bio_tickets.len(),
        "Ticket plan ready"
    );
    Ok(plan)
}

/// Split rows by the values of `keys`; groups are ordered by key
fn group_rows(table: &Table, keys: &[&str]) -> ReleaseResult<BTreeMap<Vec<String>, Table>> {
    let indices = keys
        .iter()
        .map(|k| {
            table.column_index(k).ok_or_else(|| {
                ReleaseError::Ticket(format!("error table is missing column '{}'", k))
            })
        })
        .collect::<ReleaseResult<Vec<usize>>>()?;

    let mut groups: BTreeMap<Vec<String>, Table> = BTreeMap::new();
    for row in table.rows() {
        let key: Vec<String> = indices
            .iter()
            .map(|&i| row[i].clone().unwrap_or_default())
            .collect();
        groups
            .entry(key)
            .or_insert_with(|| Table::new(table.columns().to_vec()))
            .push_row(row.clone());
    }
    Ok(groups)
}

/// File every planned ticket: manifest tickets, then one master ticket per
/// center linked to them, then the clinical/biospecimen tickets
pub async fn file_tickets(plan: &TicketPlan, sink: &dyn TicketSink) -> ReleaseResult<FiledTickets> {
    let mut filed = FiledTickets::default();
    let mut by_center: BTreeMap<&str, Vec<TicketId>> = BTreeMap::new();

    for ticket in &plan.manifest_tickets {
        let id = sink.create(&ticket.request).await?;
        by_center.entry(ticket.center.as_str()).or_default().push(id.clone());
        filed.manifest.push(id);
    }

    for (center, children) in by_center {
        let master = sink
            .create(&TicketRequest {
                title: format!("[{}] {} Master Ticket", plan.release, center),
                description: format!(
                    "Master issue to manage {} errors from {} pre-release checks",
                    center, plan.release
                ),
                attachment: None,
            })
            .await?;
        for child in &children {
            sink.link(&master, child).await?;
        }
        filed.master.push(master);
    }

    for request in &plan.clin_bio_tickets {
        filed.clin_bio.push(sink.create(request).await?);
    }

    info!(
        manifest = filed.manifest.len(),
        master = filed.master.len(),
        clin_bio = filed.clin_bio.len(),
        "Tickets filed"
    );
    Ok(filed)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum OutboxRecord {
    Ticket {
        id: TicketId,
        title: String,
        description: String,
        attachment: Option<TicketAttachment>,
        created_at: String,
    },
    Link {
        parent: TicketId,
        child: TicketId,
    },
}

/// Ticket sink appending JSON lines to a local outbox file
///
/// Ids are sequential (`HTAN-1`, `HTAN-2`, ...) and continue across runs
/// sharing the same outbox.
pub struct OutboxTicketSink {
    path: PathBuf,
    next_id: Mutex<u64>,
}

impl OutboxTicketSink {
    pub async fn open(path: &Path) -> ReleaseResult<Self> {
        let existing = match tokio::fs::read_to_string(path).await {
            Ok(content) => content
                .lines()
                .filter_map(|l| serde_json::from_str::<OutboxRecord>(l).ok())
                .filter(|r| matches!(r, OutboxRecord::Ticket { .. }))
                .count() as u64,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), existing = existing, "Ticket outbox opened");
        Ok(Self {
            path: path.to_path_buf(),
            next_id: Mutex::new(existing + 1),
        })
    }

    async fn append(&self, record: &OutboxRecord) -> ReleaseResult<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| ReleaseError::Ticket(format!("serialize outbox record: {}", e)))?;
        line.push('\n');

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl TicketSink for OutboxTicketSink {
    async fn create(&self, request: &TicketRequest) -> ReleaseResult<TicketId> {
        let mut next = self.next_id.lock().await;
        let id = TicketId(format!("HTAN-{}", *next));
        self.append(&OutboxRecord::Ticket {
            id: id.clone(),
            title: request.title.clone(),
            description: request.description.clone(),
            attachment: request.attachment.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
        })
        .await?;
        *next += 1;
        Ok(id)
    }

    async fn link(&self, parent: &TicketId, child: &TicketId) -> ReleaseResult<()> {
        self.append(&OutboxRecord::Link {
            parent: parent.clone(),
            child: child.clone(),
        })
        .await
    }
}
