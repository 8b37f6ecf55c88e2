//! Runs from an on-disk input snapshot, through promotion and ticketing

mod helpers;

use helpers::*;
use htan_release::ingest::LocalManifestSource;
use htan_release::promote::{plan_promotion, publish_promotion};
use htan_release::release_lists::{CLIN_BIO_ERRORS, ERRORS};
use htan_release::services::TableChildrenLookup;
use htan_release::sinks::{file_tickets, plan_tickets, OutboxTicketSink, ReleaseSink};
use htan_release::{load_snapshot, ReleaseRun};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_inputs(dir: &Path) {
    fs::create_dir_all(dir.join("manifests")).unwrap();
    fs::write(
        dir.join("manifest_index.csv"),
        "id,name,parentId,projectId,versionNumber,modifiedOn,path\n\
         synB1,synapse_storage_manifest_bio.csv,dsB,synP1,3,100,manifests/bio.csv\n\
         synL1,synapse_storage_manifest_wes.csv,dsL,synP1,2,200,manifests/wes.csv\n\
         synL0,synapse_storage_manifest_wes_old.csv,dsL,synP1,1,50,manifests/missing.csv\n\
         synE1,synapse_storage_manifest_empty.csv,dsE,synP1,1,300,manifests/empty.csv\n\
         synX1,notes.csv,dsX,synP1,1,400,manifests/notes.csv\n",
    )
    .unwrap();
    fs::write(
        dir.join("manifests/bio.csv"),
        "Component,HTAN Biospecimen ID,HTAN Parent ID\n\
         Biospecimen,BIO1,HTA1_1\n\
         Biospecimen,BIO1,HTA1_1\n",
    )
    .unwrap();
    fs::write(
        dir.join("manifests/wes.csv"),
        "Component,Filename,File Format,HTAN Parent Biospecimen ID,HTAN Data File ID,entityId,Lab Notes\n\
         BulkWESLevel1,wes/e1.fq,fastq,BIO1,HTA1_1_2,E1,\n\
         BulkWESLevel1,wes/e1.bam.bai,bai,BIO1,HTA1_1_3,E3,\n",
    )
    .unwrap();
    fs::write(dir.join("manifests/empty.csv"), "Component,Filename\n").unwrap();
    fs::write(
        dir.join("fileview.csv"),
        "id,currentVersion,name\nE1,1,e1.fq\nE3,1,e1.bam.bai\nsynB1,3,bio.csv\nsynL1,2,wes.csv\n",
    )
    .unwrap();
    fs::write(
        dir.join("provenance.csv"),
        "entityId,Biospecimen_Path,HTAN_Participant_ID,HTAN_Assayed_Biospecimen_ID,HTAN_Data_File_ID\n\
         E1,HTA1_1 -> BIO1,HTA1_1,BIO1,HTA1_1_2\n",
    )
    .unwrap();
    fs::write(
        dir.join("data_model.csv"),
        "Attribute,Description\nFilename,Name of a file\nComponent,Schema component\n\
         File Format,Format of a file\nHTAN Data File ID,Data file identifier\n",
    )
    .unwrap();
}

#[tokio::test]
async fn test_snapshot_run_promote_and_ticket() {
    let logs = init_test_logging();
    let inputs = TempDir::new().unwrap();
    write_inputs(inputs.path());

    let mut config = test_config();
    config.inputs.dir = inputs.path().to_path_buf();
    config.tickets.outbox = inputs.path().join("out/tickets.jsonl");

    let snapshot = load_snapshot(&config).unwrap();
    let source = LocalManifestSource::new(&config.inputs.dir, &config.inputs.manifest_index);
    let lookup = TableChildrenLookup::default();
    let (_dir, warehouse) = scratch_warehouse().await;

    let outcome = ReleaseRun::new(&config, &source, &lookup, &warehouse)
        .execute(snapshot)
        .await
        .unwrap();

    // notes.csv is not a storage manifest; synL0 is superseded by synL1
    assert_eq!(outcome.ingest.listed, 5);
    assert_eq!(outcome.ingest.selected, 3);
    assert_eq!(outcome.ingest.ingested, 2);
    assert_eq!(outcome.ingest.skipped, 1);
    logs.assert_contains("Component not found for manifest synE1");

    // the BAI row never reaches the listing; E1 sits below a duplicated biospecimen
    assert_eq!(outcome.partition.len(), 1);
    assert_eq!(outcome.partition.errored[0].entry.entity_id, "E1");

    let extra = outcome.lists.get("extra_cols").unwrap();
    assert!((0..extra.len()).any(|r| {
        extra.cell(r, "Manifest_Id") == Some("synL1") && extra.cell(r, "column_name") == Some("Lab Notes")
    }));

    let descriptions = outcome.lists.get("column_descriptions").unwrap();
    let filename_row = (0..descriptions.len())
        .find(|&r| {
            descriptions.cell(r, "table_name") == Some("shortlist")
                && descriptions.cell(r, "column_name") == Some("Filename")
        })
        .unwrap();
    assert_eq!(descriptions.cell(filename_row, "description"), Some("Name of a file"));

    // tickets from the published error tables
    let errors = warehouse.read_table(ERRORS).await.unwrap().unwrap();
    let clin_bio = warehouse.read_table(CLIN_BIO_ERRORS).await.unwrap().unwrap();
    let plan = plan_tickets(&errors, &clin_bio, "release5.0").unwrap();
    assert_eq!(plan.manifest_tickets.len(), 1);
    assert_eq!(
        plan.manifest_tickets[0].request.title,
        "[Release 5.0 Errors] HTAN A BulkWESLevel1 synL1"
    );
    assert_eq!(plan.clin_bio_tickets.len(), 1);

    let sink = OutboxTicketSink::open(&config.tickets.outbox).await.unwrap();
    let filed = file_tickets(&plan, &sink).await.unwrap();
    assert_eq!(filed.manifest.len() + filed.master.len() + filed.clin_bio.len(), 3);

    // nothing releasable: promotion keeps only what was released before
    let promotion = plan_promotion(&warehouse, &snapshot_fileview(inputs.path()), "release5.0")
        .await
        .unwrap();
    assert!(promotion.entities.is_empty());
    publish_promotion(&warehouse, &promotion).await.unwrap();
    assert!(warehouse
        .list_tables()
        .await
        .unwrap()
        .contains(&"released_entities_v5_0".to_string()));
}

fn snapshot_fileview(dir: &Path) -> htan_release::models::Fileview {
    let table = htan_common::Table::from_csv_path(&dir.join("fileview.csv")).unwrap();
    htan_release::models::Fileview::from_table(&table).unwrap()
}
