// Local ids are only unique on the rank that created the particle.
// The global id packs the owning rank into the upper 32 bits and the
// local id into the lower 32 bits.

#[inline(always)]
pub fn local_id_to_global(id: u32, cpu: u32) -> u64 {
    (u64::from(cpu) << 32) | u64::from(id)
}

/// Inverse of `local_id_to_global`, returns `(id, cpu)`.
#[inline(always)]
pub fn global_id_to_local(global_id: u64) -> (u32, u32) {
    ((global_id & 0xFFFF_FFFF) as u32, (global_id >> 32) as u32)
}
