//! Persistent storage for the user identity.
//!
//! Uses the nRF52840's internal flash via `sequential-storage` crate.
//! The identity region is kept in RAM as a small byte image (see
//! [`lorapager::ByteImage`]) that the core reads and writes byte by byte;
//! this module loads it at boot and writes it back whenever it is dirty.
//!
//! Storage layout:
//!   - One map record, key [`KEY_IDENTITY`], holding the raw image.
//!   - Records are appended sequentially; the flash pages are managed
//!     by `sequential-storage` which handles wear levelling and GC.

use defmt::{debug, error, info};
use lorapager::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START, STORAGE_IMAGE_SIZE};
use lorapager::ByteImage;

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key for the identity image in the map storage.
const KEY_IDENTITY: u8 = 0x01;

/// Scratch buffer for a serialized map item (image plus item header).
const MAX_RECORD_SIZE: usize = 64;

/// RAM mirror of the identity region.
pub type IdentityImage = ByteImage<STORAGE_IMAGE_SIZE>;

/// Load the identity image; an empty or unreadable store gives an
/// erased image, which the core resolves to the default name.
pub async fn load_image(
    flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
) -> IdentityImage {
    let mut buf = [0u8; MAX_RECORD_SIZE];

    match sequential_storage::map::fetch_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut sequential_storage::cache::NoCache::new(),
        &mut buf,
        &KEY_IDENTITY,
    )
    .await
    {
        Ok(Some(data)) => {
            info!("Loaded identity image ({} bytes)", data.len());
            IdentityImage::from_bytes(data)
        }
        Ok(None) => {
            info!("No identity in flash");
            IdentityImage::erased()
        }
        Err(e) => {
            error!("Flash read error: {:?}", defmt::Debug2Format(&e));
            IdentityImage::erased()
        }
    }
}

/// Persist the image if it changed since the last save.
pub async fn save_image(
    flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    image: &mut IdentityImage,
) {
    if !image.is_dirty() {
        debug!("Identity image: no changes to save");
        return;
    }

    let mut buf = [0u8; MAX_RECORD_SIZE];
    let item: &[u8] = image.as_bytes();

    match sequential_storage::map::store_item::<u8, &[u8], _>(
        flash,
        STORAGE_START..STORAGE_END,
        &mut sequential_storage::cache::NoCache::new(),
        &mut buf,
        &KEY_IDENTITY,
        &item,
    )
    .await
    {
        Ok(_) => {
            info!("Saved identity image to flash");
            image.mark_clean();
        }
        Err(e) => {
            // Stays dirty; retried on the next loop iteration.
            error!("Flash write error: {:?}", defmt::Debug2Format(&e));
        }
    }
}
