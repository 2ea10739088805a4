//! Random artwork selection for `upload`.

use rand::seq::IndexedRandom;
use rand::Rng;
use theframe_core::{ArtworkRecord, Catalog, ImageRef};

/// A record can be shown if its image is remote or its local file exists.
pub fn is_usable(record: &ArtworkRecord) -> bool {
    match &record.image {
        Some(ImageRef::Remote(_)) => true,
        Some(ImageRef::Local(path)) => path.is_file(),
        None => false,
    }
}

/// Uniformly pick one usable record, or `None` if there is none.
pub fn pick_random(catalog: &Catalog) -> Option<&ArtworkRecord> {
    pick_random_with(catalog, &mut rand::rng())
}

pub fn pick_random_with<'a, R: Rng + ?Sized>(
    catalog: &'a Catalog,
    rng: &mut R,
) -> Option<&'a ArtworkRecord> {
    let usable: Vec<&ArtworkRecord> = catalog.iter().filter(|r| is_usable(r)).collect();
    usable.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn remote(id: &str) -> ArtworkRecord {
        let mut record = ArtworkRecord::new(id);
        record.image = ImageRef::parse(&format!("https://art.example.com/{id}.jpg"));
        record
    }

    #[test]
    fn empty_catalog_yields_nothing() {
        assert!(pick_random(&Catalog::default()).is_none());
    }

    #[test]
    fn skips_records_without_a_usable_image() {
        let mut gone = ArtworkRecord::new("gone");
        gone.image = ImageRef::parse("/definitely/not/here.jpg");
        let bare = ArtworkRecord::new("bare");
        let catalog = Catalog::new(vec![gone, bare, remote("ok")]);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(pick_random_with(&catalog, &mut rng).unwrap().id, "ok");
        }
    }

    #[test]
    fn every_usable_record_can_be_picked() {
        let catalog = Catalog::new(vec![remote("a"), remote("b"), remote("c")]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(pick_random_with(&catalog, &mut rng).unwrap().id.clone());
        }
        assert_eq!(seen.len(), 3);
    }
}
