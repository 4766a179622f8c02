//! Stitches a paged portal listing into one ordered sequence.

use tracing::{info, instrument};

use crate::error::SyncError;
use crate::model::{PageRequest, Token, UserRecord};
use crate::portal::{Listing, PortalService};

/// Fetch every record of `listing`, one page at a time, starting at page 1.
///
/// Pages are requested strictly in order with a single request outstanding.
/// Any failure aborts the whole listing; nothing is returned partially.
#[instrument(skip_all, fields(listing = %listing))]
pub async fn fetch_all<P: PortalService + ?Sized>(
    portal: &P,
    token: &Token,
    listing: &Listing,
    page_size: u32,
) -> Result<Vec<UserRecord>, SyncError> {
    let mut users = Vec::new();
    let mut page = 1u32;

    loop {
        info!(page, "fetching page of users");
        let result = portal
            .fetch_page(token, listing, PageRequest::new(page, page_size))
            .await?;
        let page_len = result.users.len();
        users.extend(result.users);
        info!(page, page_len, total = users.len(), "fetched page of users");

        if !result.next.has_more() {
            break;
        }
        page += 1;
    }

    Ok(users)
}
