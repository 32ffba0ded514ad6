use serde::{Deserialize, Serialize};
use std::fmt;
#[cfg(feature = "bincode")]
use std::path::{Path, PathBuf};

use crate::distance::closest;
use crate::*;

#[derive(Serialize, Deserialize, PartialEq, Clone)]
/// Visual codebook built from a collection of image keypoint descriptors. Can be:
/// 1. Created.
/// 2. Saved to a file & loaded from a file (requires bincode feature, enabled by default).
/// 3. Used to transform a new set of descriptors into a BoW histogram (and
///    optionally get the word each descriptor was assigned to).
pub struct Codebook {
    words: Vec<Desc>,
    distance: Distance,
}

/// Codebook API
impl Codebook {
    /// Build a codebook from a collection of descriptors.
    ///
    /// Convergence and iteration details are logged; use [`generate`] to get them back.
    pub fn create(features: &[Desc], config: &Config) -> CodebookResult<Self> {
        generate(features, config).map(|g| g.codebook)
    }

    /// Wrap an existing set of words. All words must share one dimension.
    pub fn new(words: Vec<Desc>, distance: Distance) -> CodebookResult<Self> {
        let dim = words.first().ok_or(CodebookErr::EmptyInput)?.len();
        check_dims(&words, dim)?;
        Ok(Self::from_words(words, distance))
    }

    pub(crate) fn from_words(words: Vec<Desc>, distance: Distance) -> Self {
        Self { words, distance }
    }

    /// Transform a set of descriptors into its bag of words
    /// representation with respect to the Codebook. Histogram is l1 normalized.
    pub fn transform(&self, features: &[Desc]) -> CodebookResult<BoW> {
        self.transform_with_assignments(features).map(|(bow, _)| bow)
    }

    /// Transform a set of descriptors into its bag of words
    /// representation with respect to the Codebook. Histogram is l1 normalized.
    ///
    /// Also provides the word id each descriptor was assigned to.
    pub fn transform_with_assignments(
        &self,
        features: &[Desc],
    ) -> CodebookResult<(BoW, Vec<usize>)> {
        let assignments = self.quantize(features)?;
        let mut bow: BoW = vec![0.; self.words.len()];
        for &w in &assignments {
            bow[w] += 1.;
        }
        // Normalize BoW vector
        if !assignments.is_empty() {
            let inv_sum = 1. / assignments.len() as f32;
            for w in bow.iter_mut() {
                *w *= inv_sum;
            }
        }
        Ok((bow, assignments))
    }

    /// Id of the nearest word for every descriptor, in order.
    pub fn quantize(&self, features: &[Desc]) -> CodebookResult<Vec<usize>> {
        if self.is_empty() {
            return Err(CodebookErr::EmptyInput);
        }
        check_dims(features, self.dim())?;
        Ok(features
            .iter()
            .map(|f| closest(f, &self.words, self.distance))
            .collect())
    }

    pub fn words(&self) -> &[Desc] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Desc> {
        self.words
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Dimension shared by every word.
    pub fn dim(&self) -> usize {
        self.words.first().map_or(0, Vec::len)
    }

    /// Load a codebook from a file. Rejects files with no words or words of mixed length.
    #[cfg(feature = "bincode")]
    pub fn load<P: AsRef<Path>>(file: P) -> CodebookResult<Self> {
        let mut file = std::fs::File::open(file)?;
        let mut buffer: Vec<u8> = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut buffer)?;
        let Codebook { words, distance } = bincode::deserialize(&buffer)?;
        Self::new(words, distance)
    }

    /// Save codebook to a file, replacing whatever was there.
    #[cfg(feature = "bincode")]
    pub fn save<P: AsRef<Path>>(&self, file: P) -> CodebookResult<()> {
        save_words(&self.words, self.distance, file)
    }
}

/////////////////////                Helpers                 ////////////////////////
/////////////////////////////////////////////////////////////////////////////////////

#[cfg(feature = "bincode")]
#[derive(Serialize)]
/// Borrowed mirror of `Codebook` so checkpoints can be written without cloning the words.
struct CodebookRef<'a> {
    words: &'a [Desc],
    distance: Distance,
}

/// Write words to `file` through a sibling temp file, so readers never see a partial write.
#[cfg(feature = "bincode")]
pub(crate) fn save_words<P: AsRef<Path>>(
    words: &[Desc],
    distance: Distance,
    file: P,
) -> CodebookResult<()> {
    let file = file.as_ref();
    let serialized = bincode::serialize(&CodebookRef { words, distance })?;
    let tmp = tmp_path(file);
    let written = std::fs::File::create(&tmp).and_then(|mut f| {
        std::io::Write::write_all(&mut f, &serialized)?;
        f.sync_all()?;
        std::fs::rename(&tmp, file)
    });
    if written.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    written.map_err(CodebookErr::from)
}

#[cfg(feature = "bincode")]
fn tmp_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

impl fmt::Debug for Codebook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codebook")
            .field("Words", &self.len())
            .field("Dimension", &self.dim())
            .field("Distance", &self.distance)
            .finish()
    }
}
