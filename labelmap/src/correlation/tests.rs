use super::*;
use crate::testing::smooth_texture;
use strum::IntoEnumIterator;

fn match_template(destination: &GrayImage, template: &GrayImage, method: MatchMethod) -> SimilarityMap {
    Correlator::new(destination)
        .terms(template)
        .similarity_map(method)
}

/// Direct O(W·H·w·h) evaluation of every method, for checking the FFT path.
fn brute_force(destination: &GrayImage, template: &GrayImage, method: MatchMethod) -> Vec<f64> {
    let tw = template.width();
    let th = template.height();
    let n = (tw * th) as f64;
    let t_mean = template.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut out = Vec::new();
    for y in 0..=destination.height() - th {
        for x in 0..=destination.width() - tw {
            let mut d_mean = 0.0;
            for ty in 0..th {
                for tx in 0..tw {
                    d_mean += destination[(x + tx, y + ty)] as f64;
                }
            }
            d_mean /= n;

            let (mut sq, mut cc, mut co, mut dd, mut tt, mut dv, mut tv) =
                (0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
            for ty in 0..th {
                for tx in 0..tw {
                    let d = destination[(x + tx, y + ty)] as f64;
                    let t = template[(tx, ty)] as f64;
                    sq += (d - t) * (d - t);
                    cc += d * t;
                    co += (d - d_mean) * (t - t_mean);
                    dd += d * d;
                    tt += t * t;
                    dv += (d - d_mean) * (d - d_mean);
                    tv += (t - t_mean) * (t - t_mean);
                }
            }

            out.push(match method {
                MatchMethod::SqDiff => sq,
                MatchMethod::SqDiffNormed => (sq / (dd * tt).sqrt()).min(1.0),
                MatchMethod::CCorr => cc,
                MatchMethod::CCorrNormed => cc / (dd * tt).sqrt(),
                MatchMethod::CCoeff => co,
                MatchMethod::CCoeffNormed => co / (dv * tv).sqrt(),
            });
        }
    }
    out
}

#[test]
fn test_fft_friendly_size() {
    assert_eq!(fft_friendly_size(0), 1);
    assert_eq!(fft_friendly_size(1), 1);
    assert_eq!(fft_friendly_size(7), 8);
    assert_eq!(fft_friendly_size(11), 12);
    assert_eq!(fft_friendly_size(97), 100);
    assert_eq!(fft_friendly_size(500), 500);
    assert_eq!(fft_friendly_size(501), 512);
}

#[test]
fn test_all_methods_match_brute_force() {
    let destination = smooth_texture(37, 29, 3);
    let template = destination.crop(9, 6, 11, 8);

    for method in MatchMethod::iter() {
        let map = match_template(&destination, &template, method);
        assert_eq!(map.width(), 37 - 11 + 1);
        assert_eq!(map.height(), 29 - 8 + 1);

        let expected = brute_force(&destination, &template, method);
        for (i, (&got, &want)) in map.iter().zip(&expected).enumerate() {
            let tolerance = 1e-4 * want.abs().max(1.0);
            assert!(
                (got as f64 - want).abs() <= tolerance,
                "{} at {}: fft {} vs direct {}",
                method,
                i,
                got,
                want
            );
        }
    }
}

#[test]
fn test_exact_crop_is_found_by_every_method() {
    let destination = smooth_texture(60, 50, 11);
    let template = destination.crop(21, 14, 16, 16);
    let correlator = Correlator::new(&destination);
    let terms = correlator.terms(&template);

    for method in [
        MatchMethod::SqDiff,
        MatchMethod::SqDiffNormed,
        MatchMethod::CCoeff,
        MatchMethod::CCoeffNormed,
        MatchMethod::CCorrNormed,
    ] {
        let extrema = min_max_loc(&terms.similarity_map(method)).expect("non-empty map");
        let best = if method.lower_is_better() {
            extrema.min_loc
        } else {
            extrema.max_loc
        };
        assert_eq!(best, IVec2::new(21, 14), "{} located the crop elsewhere", method);
    }
}

#[test]
fn test_degenerate_windows_score_neutral() {
    // Flat destination: zero variance everywhere.
    let destination = GrayImage::new_filled(10, 10, 50);
    let template = smooth_texture(4, 4, 5);

    let coeff = match_template(&destination, &template, MatchMethod::CCoeffNormed);
    assert!(coeff.iter().all(|&v| v == 0.0));

    // Black destination: zero energy everywhere.
    let black = GrayImage::new_default(10, 10);
    let sqdiff = match_template(&black, &template, MatchMethod::SqDiffNormed);
    assert!(sqdiff.iter().all(|&v| v == 1.0));
    let ccorr = match_template(&black, &template, MatchMethod::CCorrNormed);
    assert!(ccorr.iter().all(|&v| v == 0.0));
}

#[test]
fn test_template_same_size_as_destination() {
    let destination = smooth_texture(12, 9, 2);
    let map = match_template(&destination, &destination, MatchMethod::CCoeffNormed);
    assert_eq!((map.width(), map.height()), (1, 1));
    assert!((map[(0, 0)] - 1.0).abs() < 1e-5);
}

#[test]
#[should_panic(expected = "does not fit destination")]
fn test_oversized_template_panics() {
    let destination = smooth_texture(10, 10, 2);
    let template = smooth_texture(11, 5, 2);
    Correlator::new(&destination).terms(&template);
}

#[test]
fn test_min_max_loc_first_occurrence() {
    let map = SimilarityMap::new(3, 2, vec![1.0, 5.0, 0.0, 5.0, f32::NAN, 0.0]);
    let extrema = min_max_loc(&map).expect("non-empty map");
    assert_eq!(extrema.max_value, 5.0);
    assert_eq!(extrema.max_loc, IVec2::new(1, 0));
    assert_eq!(extrema.min_value, 0.0);
    assert_eq!(extrema.min_loc, IVec2::new(2, 0));

    let empty = SimilarityMap::new(0, 0, Vec::new());
    assert!(min_max_loc(&empty).is_none());
}

#[test]
fn test_transpose() {
    let data = [1, 2, 3, 4, 5, 6];
    assert_eq!(transpose(&data, 2, 3), vec![1, 4, 2, 5, 3, 6]);
}
