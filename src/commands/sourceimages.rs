// ABOUTME: Source image command implementations.
// ABOUTME: Single-image calls print their result; batch subcommands run a job and print the summary.

use crate::cli::SourceImagesCommand;
use nonempty::NonEmpty;
use rokka::batch::{self, ConfirmationGate};
use rokka::client::{Client, ListOptions, ListSourceImagesResponse, SourceImage};
use rokka::config::Config;
use rokka::error::{Error, Result};
use rokka::output::{Output, OutputMode, SummaryWording};
use rokka::sourceimages::{copy_all_job, delete_all_job, mass_upload_job};
use std::path::Path;
use std::sync::Arc;

const COPIED: SummaryWording = SummaryWording {
    verb: "copied",
    noun: "source images",
};
const DELETED: SummaryWording = SummaryWording {
    verb: "deleted",
    noun: "source images",
};
const UPLOADED: SummaryWording = SummaryWording {
    verb: "uploaded",
    noun: "images",
};

pub async fn run(config: &Config, command: SourceImagesCommand, output: &Output) -> Result<()> {
    let (job, args, wording) = match command {
        SourceImagesCommand::List {
            organization,
            limit,
            offset,
        } => {
            let mut options = ListOptions::default();
            options.limit = limit;
            if let Some(offset) = offset {
                options = options.offset(offset);
            }
            let response = connect(config)?
                .list_source_images(&organization, &options)
                .await?;
            output.data(&render_list(&response), &response);
            return Ok(());
        }
        SourceImagesCommand::Get { organization, hash } => {
            let image = connect(config)?.get_source_image(&organization, &hash).await?;
            output.data(&render_image(&image), &image);
            return Ok(());
        }
        SourceImagesCommand::Delete { organization, hash } => {
            connect(config)?
                .delete_source_image(&organization, &hash)
                .await?;
            output.success("Successfully deleted source image.");
            return Ok(());
        }
        SourceImagesCommand::Copy {
            source,
            hash,
            destination,
        } => {
            let response = connect(config)?
                .copy_source_images(&source, &[hash.as_str()], &destination)
                .await?;
            if response.copied(1) == 0 {
                return Err(Error::InvalidArgument(format!(
                    "source image {hash} was not copied from {source} to {destination}"
                )));
            }
            output.success("Successfully copied source image.");
            return Ok(());
        }
        SourceImagesCommand::CopyAll {
            source,
            destination,
            batch,
        } => (copy_all_job(source, destination), batch, COPIED),
        SourceImagesCommand::DeleteAll {
            organization,
            batch,
        } => (delete_all_job(organization), batch, DELETED),
        SourceImagesCommand::MassUpload {
            organization,
            path,
            recursive,
            extensions,
            batch,
        } => {
            check_directory(&path)?;
            let extensions = normalize_extensions(extensions)?;
            (
                mass_upload_job(organization, path, recursive, extensions),
                batch,
                UPLOADED,
            )
        }
    };

    let mut options = args.options();
    if output.mode() != OutputMode::Normal {
        options = options.no_progress(true);
    }
    if options.dry_run {
        output.info("Dry run: nothing will be changed on rokka");
    }

    let client = Arc::new(connect(config)?);
    let mut gate = ConfirmationGate::stdin();
    match batch::run(client, options, job, &mut gate).await {
        Ok(summary) => {
            output.summary(wording, &summary);
            Ok(())
        }
        Err(e) => {
            // A failed scan still reports what was done before it stopped.
            if let Some(partial) = e.partial_summary() {
                output.summary(wording, partial);
            }
            Err(e.into())
        }
    }
}

fn connect(config: &Config) -> Result<Client> {
    Ok(Client::new(config.client_config())?)
}

fn render_list(response: &ListSourceImagesResponse) -> String {
    let mut text = String::from("Name\tHash\tDetails\n");
    for image in &response.items {
        text.push_str(&format!(
            "{}\t{}\t{}, {}x{}\n",
            image.name, image.hash, image.mime_type, image.width, image.height
        ));
    }
    text.push_str(&format!("\nTotal: {}\n", response.total));
    if let Some(cursor) = response.cursor.as_deref().filter(|c| !c.is_empty()) {
        text.push_str(&format!("Next offset: {cursor}\n"));
    }
    text
}

fn render_image(image: &SourceImage) -> String {
    let created = image
        .created
        .map(|c| c.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Hash:\t{} ({})\nName:\t{}\nDetails:\t{}, {}x{}, {} bytes\nCreated at:\t{}\nBinary hash:\t{}\n",
        image.hash,
        image.short_hash,
        image.name,
        image.mime_type,
        image.width,
        image.height,
        image.size,
        created,
        image.binary_hash,
    )
}

fn check_directory(path: &Path) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        Error::InvalidArgument(format!("cannot read '{}': {}", path.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "'{}' is not a directory",
            path.display()
        )));
    }
    Ok(())
}

/// Accept "jpg" and ".jpg" alike; reject an empty list.
fn normalize_extensions(extensions: Vec<String>) -> Result<NonEmpty<String>> {
    let extensions: Vec<String> = extensions
        .into_iter()
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect();

    NonEmpty::from_vec(extensions)
        .ok_or_else(|| Error::InvalidArgument("at least one extension is required".into()))
}
