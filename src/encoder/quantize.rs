//! Palette reduction at 4 bits per channel.
//!
//! Pixels are binned into a 4096-entry rgb444 histogram. When more bins are
//! occupied than the palette allows, bins are grouped by median cut. Every
//! step walks bins in a fixed order, so equal input gives an equal palette.

/// Upper bound of a GIF colour table.
pub const MAX_COLORS: usize = 256;

const BINS: usize = 1 << 12;

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    count: u64,
    r: u64,
    g: u64,
    b: u64,
}

impl Bin {
    fn mean(&self) -> [u8; 3] {
        if self.count == 0 {
            return [0, 0, 0];
        }
        [
            (self.r / self.count) as u8,
            (self.g / self.count) as u8,
            (self.b / self.count) as u8,
        ]
    }
}

#[inline]
fn bin_of(r: u8, g: u8, b: u8) -> usize {
    ((r as usize >> 4) << 8) | ((g as usize >> 4) << 4) | (b as usize >> 4)
}

/// A group of occupied bins, cut along its widest channel.
#[derive(Debug, Clone)]
struct ColorBox {
    bins: Vec<(usize, Bin)>,
}

impl ColorBox {
    fn pixel_count(&self) -> u64 {
        self.bins.iter().map(|(_, bin)| bin.count).sum()
    }

    fn widest_channel(&self) -> usize {
        let mut min = [u8::MAX; 3];
        let mut max = [0u8; 3];
        for (_, bin) in &self.bins {
            let mean = bin.mean();
            for c in 0..3 {
                min[c] = min[c].min(mean[c]);
                max[c] = max[c].max(mean[c]);
            }
        }
        let range = |c: usize| max[c].saturating_sub(min[c]);
        if range(0) >= range(1) && range(0) >= range(2) {
            0
        } else if range(1) >= range(2) {
            1
        } else {
            2
        }
    }

    fn split(mut self) -> (ColorBox, ColorBox) {
        let channel = self.widest_channel();
        // stable sort, ties keep bin order
        self.bins.sort_by_key(|(_, bin)| bin.mean()[channel]);

        let half = self.pixel_count() / 2;
        let mut running = 0u64;
        let mut split_at = self.bins.len() / 2;
        for (i, (_, bin)) in self.bins.iter().enumerate() {
            running += bin.count;
            if running >= half {
                split_at = i + 1;
                break;
            }
        }
        split_at = split_at.clamp(1, self.bins.len() - 1);

        let right = self.bins.split_off(split_at);
        (ColorBox { bins: self.bins }, ColorBox { bins: right })
    }

    fn average(&self) -> [u8; 3] {
        let merged = self.bins.iter().fold(Bin::default(), |acc, (_, bin)| Bin {
            count: acc.count + bin.count,
            r: acc.r + bin.r,
            g: acc.g + bin.g,
            b: acc.b + bin.b,
        });
        merged.mean()
    }
}

/// A reduced colour table and the bin-to-index table that applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
    lookup: Vec<u8>,
}

impl Palette {
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Flat `r, g, b, r, g, b, ...` table as written into a GIF.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }

    pub fn index_of(&self, r: u8, g: u8, b: u8) -> u8 {
        self.lookup[bin_of(r, g, b)]
    }

    /// Maps an RGBA buffer to palette indices, one per pixel, into `out`.
    pub fn apply(&self, rgba: &[u8], out: &mut Vec<u8>) {
        out.clear();
        out.extend(rgba.chunks_exact(4).map(|px| self.index_of(px[0], px[1], px[2])));
    }
}

/// Builds a palette of at most `max_colors` entries for an RGBA buffer. Alpha is ignored.
pub fn quantize(rgba: &[u8], max_colors: usize) -> Palette {
    let max_colors = max_colors.clamp(1, MAX_COLORS);

    let mut histogram = vec![Bin::default(); BINS];
    for px in rgba.chunks_exact(4) {
        let bin = &mut histogram[bin_of(px[0], px[1], px[2])];
        bin.count += 1;
        bin.r += px[0] as u64;
        bin.g += px[1] as u64;
        bin.b += px[2] as u64;
    }

    let occupied: Vec<(usize, Bin)> = histogram
        .iter()
        .enumerate()
        .filter(|(_, bin)| bin.count > 0)
        .map(|(key, bin)| (key, *bin))
        .collect();

    let mut lookup = vec![0u8; BINS];

    if occupied.is_empty() {
        return Palette {
            colors: vec![[255, 255, 255]],
            lookup,
        };
    }

    if occupied.len() <= max_colors {
        let colors = occupied
            .iter()
            .enumerate()
            .map(|(index, (key, bin))| {
                lookup[*key] = index as u8;
                bin.mean()
            })
            .collect();
        return Palette { colors, lookup };
    }

    let mut boxes = vec![ColorBox { bins: occupied }];
    while boxes.len() < max_colors {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.bins.len() > 1)
            .max_by_key(|(_, b)| b.pixel_count())
            .map(|(i, _)| i);
        let Some(index) = candidate else {
            break;
        };
        let (left, right) = boxes.remove(index).split();
        boxes.push(left);
        boxes.push(right);
    }

    let colors: Vec<[u8; 3]> = boxes.iter().map(ColorBox::average).collect();
    for color_box in &boxes {
        for (key, bin) in &color_box.bins {
            lookup[*key] = nearest(&colors, bin.mean());
        }
    }

    Palette { colors, lookup }
}

fn nearest(colors: &[[u8; 3]], target: [u8; 3]) -> u8 {
    colors
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| {
            (0..3)
                .map(|i| {
                    let d = c[i] as i32 - target[i] as i32;
                    (d * d) as u32
                })
                .sum::<u32>()
        })
        .map(|(i, _)| i as u8)
        .unwrap_or(0)
}
