use crate::diags::invariants::Invariants;
use crate::diags::OutputType;
use crate::prtls::{ids::local_id_to_global, Particle, RefPart};
use crate::Float;
use std::fmt;
use std::io::{self, Write};

// One line per record, fields separated by a single space. Reals use
// the shortest representation that round trips, so 1.0 is written as 1.
// Magnitudes below 1e-5 or from 1e16 up switch to exponent form.

struct Real(Float);

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mag = self.0.abs();
        if mag.is_finite() && mag != 0.0 && (mag < 1e-5 || mag >= 1e16) {
            write!(f, "{:e}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

pub fn write_header<W: Write>(w: &mut W, otype: OutputType) -> io::Result<()> {
    writeln!(w, "{}", otype.header())
}

#[inline(always)]
pub fn write_particle<W: Write>(w: &mut W, p: &Particle) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {} {} {} {}",
        local_id_to_global(p.id, p.cpu),
        Real(p.x),
        Real(p.y),
        Real(p.t),
        Real(p.px),
        Real(p.py),
        Real(p.pt)
    )
}

#[inline(always)]
pub fn write_invariants<W: Write>(w: &mut W, p: &Particle, inv: &Invariants) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {}",
        local_id_to_global(p.id, p.cpu),
        Real(inv.h),
        Real(inv.i)
    )
}

pub fn write_ref_particle<W: Write>(w: &mut W, step: u32, r: &RefPart) -> io::Result<()> {
    writeln!(
        w,
        "{} {} {} {} {} {} {} {} {} {}",
        step,
        Real(r.s),
        Real(r.x),
        Real(r.y),
        Real(r.z),
        Real(r.t),
        Real(r.px),
        Real(r.py),
        Real(r.pz),
        Real(r.pt)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn headers() {
        assert_eq!(
            written(|w| write_header(w, OutputType::Particles)),
            "id x y t px py pt\n"
        );
        assert_eq!(
            written(|w| write_header(w, OutputType::NonlinearLensInvariants)),
            "id H I\n"
        );
        assert_eq!(
            written(|w| write_header(w, OutputType::RefParticle)),
            "step s x y z t px py pz pt\n"
        );
    }

    #[test]
    fn particle_line() {
        let p = Particle {
            x: 1.0,
            y: 2.0,
            t: 0.0,
            id: 3,
            cpu: 2,
            px: 0.1,
            py: 0.2,
            pt: 0.3,
        };
        assert_eq!(
            written(|w| write_particle(w, &p)),
            "8589934595 1 2 0 0.1 0.2 0.3\n"
        );
    }

    #[test]
    fn invariant_line() {
        // same id as the raw dump of the same particle
        let p = Particle {
            id: 3,
            cpu: 2,
            ..Particle::default()
        };
        let inv = Invariants { h: 0.5, i: -1.25 };
        assert_eq!(
            written(|w| write_invariants(w, &p, &inv)),
            "8589934595 0.5 -1.25\n"
        );
    }

    #[test]
    fn tiny_and_huge_reals() {
        assert_eq!(Real(1e-30).to_string(), "1e-30");
        assert_eq!(Real(-2.5e-7).to_string(), "-2.5e-7");
        assert_eq!(Real(3e38).to_string(), "3e38");
        assert_eq!(Real(1e-5).to_string(), "0.00001");
        assert_eq!(Real(0.1).to_string(), "0.1");
        assert_eq!(Real(1.0).to_string(), "1");
        assert_eq!(Real(0.0).to_string(), "0");
        assert_eq!(Real(-12345.5).to_string(), "-12345.5");

        let p = Particle {
            x: 1e-30,
            id: 1,
            ..Particle::default()
        };
        assert_eq!(written(|w| write_particle(w, &p)), "1 1e-30 0 0 0 0 0\n");
    }

    #[test]
    fn ref_particle_line() {
        let r = RefPart {
            s: 10.0,
            z: 5.0,
            pz: 1.0,
            ..RefPart::default()
        };
        assert_eq!(
            written(|w| write_ref_particle(w, 5, &r)),
            "5 10 0 0 5 0 0 0 1 0\n"
        );
    }

    #[test]
    fn fields_match_header() {
        let p = Particle {
            x: -1.5,
            y: 1e-3,
            t: 2.0,
            id: 1,
            cpu: 0,
            px: 0.0,
            py: 0.0,
            pt: -3.0,
        };
        let header = written(|w| write_header(w, OutputType::Particles));
        let line = written(|w| write_particle(w, &p));
        assert_eq!(
            header.split_whitespace().count(),
            line.split_whitespace().count()
        );
    }
}
